//! Schema migration for the raw client table.
//!
//! Runs on every load, before typed parsing. Older tables predate the
//! `Advance`, `Offer`, and `History` columns; migration backfills whatever is
//! missing so the rest of the store only ever sees the full schema.

/// Required columns and their backfill defaults, in canonical order.
pub const REQUIRED_COLUMNS: [(&str, &str); 6] = [
    ("Name", ""),
    ("Phone", ""),
    ("DueDate", ""),
    ("Advance", "0"),
    ("Offer", ""),
    ("History", ""),
];

/// An untyped view of the client table: a header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn empty() -> Self {
        Self {
            headers: REQUIRED_COLUMNS
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Index of a column by header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn default_for(header: &str) -> &'static str {
    REQUIRED_COLUMNS
        .iter()
        .find(|(name, _)| *name == header)
        .map(|(_, default)| *default)
        .unwrap_or("")
}

/// Ensure every required column exists, backfilling defaults for existing
/// rows. Extra columns are preserved untouched. Idempotent. Returns whether
/// the table was mutated, so the caller can re-persist.
pub fn migrate(table: &mut RawTable) -> bool {
    let mut changed = false;

    // Pad short rows (hand-edited files) to the current header width before
    // appending columns, so backfilled cells land under the right header.
    let pad_defaults: Vec<&'static str> =
        table.headers.iter().map(|h| default_for(h)).collect();
    for row in &mut table.rows {
        while row.len() < pad_defaults.len() {
            row.push(pad_defaults[row.len()].to_string());
            changed = true;
        }
    }

    for (name, default) in REQUIRED_COLUMNS {
        if table.column(name).is_some() {
            continue;
        }
        table.headers.push(name.to_string());
        for row in &mut table.rows {
            row.push(default.to_string());
        }
        changed = true;
    }

    changed
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{RawTable, migrate};

    fn legacy_table() -> RawTable {
        RawTable {
            headers: vec!["Name".into(), "Phone".into(), "DueDate".into()],
            rows: vec![
                vec!["Riya".into(), "+919000000000".into(), "15-06-2024".into()],
                vec!["Amit".into(), "+918111111111".into(), "20-06-2024".into()],
            ],
        }
    }

    #[test]
    fn migrate_backfills_missing_columns_with_defaults() {
        let mut table = legacy_table();
        assert!(migrate(&mut table));

        assert_eq!(
            table.headers,
            vec!["Name", "Phone", "DueDate", "Advance", "Offer", "History"]
        );
        for row in &table.rows {
            assert_eq!(row.len(), 6);
            assert_eq!(row[3], "0");
            assert_eq!(row[4], "");
            assert_eq!(row[5], "");
        }
    }

    #[test]
    fn migrate_preserves_existing_values() {
        let mut table = legacy_table();
        migrate(&mut table);

        assert_eq!(table.rows[0][0], "Riya");
        assert_eq!(table.rows[0][1], "+919000000000");
        assert_eq!(table.rows[0][2], "15-06-2024");
        assert_eq!(table.rows[1][0], "Amit");
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut once = legacy_table();
        migrate(&mut once);

        let mut twice = once.clone();
        assert!(!migrate(&mut twice), "second run must not mutate");
        assert_eq!(once, twice);
    }

    #[test]
    fn migrate_reports_no_change_for_complete_tables() {
        let mut table = RawTable::empty();
        table.rows.push(vec![
            "Riya".into(),
            "+919000000000".into(),
            "15-06-2024".into(),
            "500".into(),
            "10% off".into(),
            "Joined 01-06-2024".into(),
        ]);
        assert!(!migrate(&mut table));
    }

    #[test]
    fn migrate_pads_short_rows_with_column_defaults() {
        let mut table = RawTable::empty();
        table.rows.push(vec!["Riya".into(), "+919000000000".into()]);

        assert!(migrate(&mut table));
        assert_eq!(table.rows[0], vec!["Riya", "+919000000000", "", "0", "", ""]);
    }

    #[test]
    fn migrate_pads_before_appending_columns() {
        // A short row in a legacy table must not absorb backfill cells meant
        // for the appended columns.
        let mut table = RawTable {
            headers: vec!["Name".into(), "Phone".into(), "DueDate".into()],
            rows: vec![vec!["Riya".into()]],
        };

        migrate(&mut table);
        assert_eq!(table.rows[0], vec!["Riya", "", "", "0", "", ""]);
    }

    #[test]
    fn migrate_preserves_extra_columns() {
        let mut table = legacy_table();
        table.headers.push("Notes".into());
        for row in &mut table.rows {
            row.push("vip".into());
        }

        migrate(&mut table);
        let notes = table.column("Notes").expect("column kept");
        assert_eq!(table.rows[0][notes], "vip");
    }
}
