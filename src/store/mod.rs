//! Client-table persistence.
//!
//! The table is a CSV file read fully into memory, mutated, and written back
//! wholesale — a single-operator store with no locking. Writes go through a
//! temp file and an atomic rename so a failure mid-write cannot corrupt the
//! previous table.
//!
//! `DueDate` is `DD-MM-YYYY` in the file and a parsed `NaiveDate` everywhere
//! else; the string form exists only at this boundary.

pub mod migrate;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::store::migrate::{RawTable, migrate};

pub const DUE_DATE_FORMAT: &str = "%d-%m-%Y";
const HISTORY_STAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// One row of the client table, keyed logically by normalized phone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub name: String,
    /// Normalized: spaces and hyphens stripped; expected to carry a country
    /// code (e.g. `+919000000000`).
    pub phone: String,
    pub due_date: Option<NaiveDate>,
    /// Amount already paid. Never negative.
    pub advance: Decimal,
    /// Free-text promotional note, may be empty.
    pub offer: String,
    /// Append-only lifecycle log, human-readable.
    pub history: String,
}

impl ClientRecord {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        due_date: Option<NaiveDate>,
        advance: Decimal,
        offer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: normalize_phone(&phone.into()),
            due_date,
            advance,
            offer: offer.into(),
            history: String::new(),
        }
    }
}

/// Result of loading the table: a missing backing file is "genuinely empty",
/// distinct from a load failure (`StoreError`).
#[derive(Debug)]
pub enum LoadOutcome {
    Missing,
    Loaded(Vec<ClientRecord>),
}

impl LoadOutcome {
    /// Collapse `Missing` into an empty table for callers that only read.
    pub fn into_records(self) -> Vec<ClientRecord> {
        match self {
            Self::Missing => Vec::new(),
            Self::Loaded(records) => records,
        }
    }
}

/// Whether an upsert matched an existing row or appended a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Strip spaces and hyphens, exactly the normalization the table has always
/// used. Everything else passes through.
pub fn normalize_phone(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect()
}

pub fn format_due_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

/// Update the row whose normalized phone matches, overwriting fields and
/// appending an update stamp to `History`; otherwise append a new row with a
/// join stamp. Phone identity is the canonical dedup rule.
pub fn upsert(
    records: &mut Vec<ClientRecord>,
    mut incoming: ClientRecord,
    now: NaiveDateTime,
) -> UpsertOutcome {
    incoming.phone = normalize_phone(&incoming.phone);
    let stamp = now.format(HISTORY_STAMP_FORMAT).to_string();

    match records
        .iter_mut()
        .find(|r| normalize_phone(&r.phone) == incoming.phone)
    {
        Some(existing) => {
            existing.name = incoming.name;
            existing.phone = incoming.phone;
            existing.due_date = incoming.due_date;
            existing.advance = incoming.advance;
            existing.offer = incoming.offer;
            if existing.history.is_empty() {
                existing.history = format!("Updated {stamp}");
            } else {
                existing.history.push_str(&format!("; Updated {stamp}"));
            }
            UpsertOutcome::Updated
        }
        None => {
            incoming.history = format!("Joined {stamp}");
            records.push(incoming);
            UpsertOutcome::Inserted
        }
    }
}

/// Delete by display name. Returns whether anything was removed.
pub fn remove_by_name(records: &mut Vec<ClientRecord>, name: &str) -> bool {
    let before = records.len();
    let target = name.trim();
    records.retain(|r| r.name != target);
    records.len() < before
}

/// Records due exactly on `date`.
pub fn due_on(records: &[ClientRecord], date: NaiveDate) -> Vec<&ClientRecord> {
    records
        .iter()
        .filter(|r| r.due_date == Some(date))
        .collect()
}

/// CSV-backed store for the client table.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the table, migrating the schema in place. A migrated table is
    /// re-persisted before it is returned.
    pub fn load(&self) -> Result<LoadOutcome, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadOutcome::Missing);
            }
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let mut table = self.parse_raw(&raw)?;
        if migrate(&mut table) {
            tracing::info!(path = %self.path.display(), "migrated client table schema");
            self.save_raw(&table)?;
        }

        let records = self.parse_records(&table)?;
        Ok(LoadOutcome::Loaded(records))
    }

    /// Persist the full table, overwriting any prior content.
    pub fn save(&self, records: &[ClientRecord]) -> Result<(), StoreError> {
        let mut table = RawTable::empty();
        for record in records {
            table.rows.push(vec![
                record.name.clone(),
                record.phone.clone(),
                record.due_date.map(format_due_date).unwrap_or_default(),
                record.advance.to_string(),
                record.offer.clone(),
                record.history.clone(),
            ]);
        }
        self.save_raw(&table)
    }

    fn parse_raw(&self, raw: &str) -> Result<RawTable, StoreError> {
        let malformed = |e: csv::Error| StoreError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(raw.as_bytes());

        let headers = reader
            .headers()
            .map_err(malformed)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(malformed)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawTable { headers, rows })
    }

    fn parse_records(&self, table: &RawTable) -> Result<Vec<ClientRecord>, StoreError> {
        let column = |name: &'static str| {
            table.column(name).ok_or_else(|| StoreError::Malformed {
                path: self.path.clone(),
                message: format!("missing column {name} after migration"),
            })
        };
        let name_col = column("Name")?;
        let phone_col = column("Phone")?;
        let due_col = column("DueDate")?;
        let advance_col = column("Advance")?;
        let offer_col = column("Offer")?;
        let history_col = column("History")?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (index, row) in table.rows.iter().enumerate() {
            let row_number = index + 1;

            let due_cell = row[due_col].trim();
            let due_date = if due_cell.is_empty() {
                None
            } else {
                Some(
                    NaiveDate::parse_from_str(due_cell, DUE_DATE_FORMAT).map_err(|e| {
                        StoreError::InvalidField {
                            row: row_number,
                            column: "DueDate",
                            value: due_cell.to_string(),
                            message: format!("expected DD-MM-YYYY: {e}"),
                        }
                    })?,
                )
            };

            let advance_cell = row[advance_col].trim();
            let advance = if advance_cell.is_empty() {
                Decimal::ZERO
            } else {
                Decimal::from_str(advance_cell).map_err(|e| StoreError::InvalidField {
                    row: row_number,
                    column: "Advance",
                    value: advance_cell.to_string(),
                    message: e.to_string(),
                })?
            };
            if advance < Decimal::ZERO {
                return Err(StoreError::InvalidField {
                    row: row_number,
                    column: "Advance",
                    value: advance_cell.to_string(),
                    message: "advance must not be negative".to_string(),
                });
            }

            records.push(ClientRecord {
                name: row[name_col].trim().to_string(),
                phone: normalize_phone(&row[phone_col]),
                due_date,
                advance,
                offer: row[offer_col].clone(),
                history: row[history_col].clone(),
            });
        }

        Ok(records)
    }

    fn save_raw(&self, table: &RawTable) -> Result<(), StoreError> {
        let write_err = |e: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source: e,
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&table.headers)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        for row in &table.rows {
            writer
                .write_record(row)
                .map_err(|e| write_err(std::io::Error::other(e)))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        // Write the whole table to a sibling temp file, then rename over the
        // old one. Rename is atomic on the same filesystem.
        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "clients.csv".into());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, bytes).map_err(write_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use crate::error::StoreError;

    use super::{
        ClientRecord, CsvStore, LoadOutcome, UpsertOutcome, due_on, normalize_phone,
        remove_by_name, upsert,
    };

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, super::DUE_DATE_FORMAT).expect("valid date")
    }

    fn stamp(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%d-%m-%Y %H:%M").expect("valid stamp")
    }

    fn riya() -> ClientRecord {
        ClientRecord::new(
            "Riya",
            "+91 90000-00000",
            Some(date("15-06-2024")),
            Decimal::from(500),
            "10% off",
        )
    }

    #[test]
    fn normalize_phone_strips_spaces_and_hyphens() {
        assert_eq!(normalize_phone(" +91 90000-00000 "), "+919000000000");
        assert_eq!(normalize_phone("+919000000000"), "+919000000000");
    }

    #[test]
    fn load_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvStore::new(dir.path().join("clients.csv"));

        assert!(matches!(store.load().expect("load"), LoadOutcome::Missing));
    }

    #[test]
    fn save_then_load_round_trips_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvStore::new(dir.path().join("clients.csv"));

        let mut record = riya();
        record.history = "Joined 01-06-2024 10:00".to_string();
        store.save(&[record.clone()]).expect("save");

        let loaded = store.load().expect("load").into_records();
        assert_eq!(loaded, vec![record]);
    }

    #[test]
    fn load_migrates_legacy_schema_and_re_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clients.csv");
        std::fs::write(
            &path,
            "Name,Phone,DueDate\nRiya,+919000000000,15-06-2024\n",
        )
        .expect("seed legacy file");

        let store = CsvStore::new(&path);
        let loaded = store.load().expect("load").into_records();
        assert_eq!(loaded[0].advance, Decimal::ZERO);
        assert_eq!(loaded[0].offer, "");

        // The migrated schema must be back on disk.
        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.lines().next().expect("header").contains("History"));
    }

    #[test]
    fn load_rejects_malformed_due_date() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clients.csv");
        std::fs::write(
            &path,
            "Name,Phone,DueDate,Advance,Offer,History\nRiya,+919000000000,June 15,0,,\n",
        )
        .expect("seed file");

        let err = CsvStore::new(&path).load().expect_err("must reject");
        let StoreError::InvalidField { row, column, .. } = err else {
            panic!("expected InvalidField");
        };
        assert_eq!(row, 1);
        assert_eq!(column, "DueDate");
    }

    #[test]
    fn load_rejects_negative_advance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clients.csv");
        std::fs::write(
            &path,
            "Name,Phone,DueDate,Advance,Offer,History\nRiya,+919000000000,15-06-2024,-5,,\n",
        )
        .expect("seed file");

        let err = CsvStore::new(&path).load().expect_err("must reject");
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn upsert_appends_new_phone_with_join_stamp() {
        let mut records = Vec::new();
        let outcome = upsert(&mut records, riya(), stamp("01-06-2024 10:00"));

        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].history, "Joined 01-06-2024 10:00");
    }

    #[test]
    fn upsert_updates_matching_phone_in_place_and_appends_history() {
        let mut records = Vec::new();
        upsert(&mut records, riya(), stamp("01-06-2024 10:00"));

        // Same phone, differently formatted; fields change.
        let mut updated = riya();
        updated.phone = "+91 9000000000".to_string();
        updated.advance = Decimal::from(700);
        let outcome = upsert(&mut records, updated, stamp("20-06-2024 14:02"));

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(records.len(), 1, "no duplicate row");
        assert_eq!(records[0].advance, Decimal::from(700));
        assert_eq!(
            records[0].history,
            "Joined 01-06-2024 10:00; Updated 20-06-2024 14:02"
        );
    }

    #[test]
    fn remove_by_name_deletes_matching_rows() {
        let mut records = Vec::new();
        upsert(&mut records, riya(), stamp("01-06-2024 10:00"));

        assert!(remove_by_name(&mut records, " Riya "));
        assert!(records.is_empty());
        assert!(!remove_by_name(&mut records, "Riya"));
    }

    #[test]
    fn due_on_matches_exact_date_only() {
        let mut records = Vec::new();
        upsert(&mut records, riya(), stamp("01-06-2024 10:00"));

        assert_eq!(due_on(&records, date("15-06-2024")).len(), 1);
        assert!(due_on(&records, date("16-06-2024")).is_empty());

        let mut no_due = riya();
        no_due.phone = "+918111111111".to_string();
        no_due.due_date = None;
        upsert(&mut records, no_due, stamp("01-06-2024 10:00"));
        assert_eq!(due_on(&records, date("15-06-2024")).len(), 1);
    }
}
