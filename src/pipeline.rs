//! The reminder pipeline: load → migrate → select due → compose → link.
//!
//! Produces one [`PreparedReminder`] per due record for the shell to print,
//! open, or hand to the automated sender. Missing credentials are checked by
//! the caller *before* this runs — by the time we iterate records there are
//! no blocking preconditions left, only per-record best-effort composition.

use chrono::NaiveDate;

use crate::config::Config;
use crate::error::StoreError;
use crate::links::{append_payment_section, message_link, payment_link};
use crate::reminder::{ComposeRequest, TextGenerator, compose};
use crate::store::{CsvStore, due_on};

/// A reminder ready to leave the system, one per due client.
#[derive(Debug, Clone)]
pub struct PreparedReminder {
    pub name: String,
    pub phone: String,
    /// Composed text, including the payment section when a UPI id is
    /// configured.
    pub message: String,
    /// `wa.me` deep link whose text decodes to `message` exactly.
    pub wa_link: String,
}

/// Compose reminders for every record due on `today`.
///
/// A missing store yields an empty batch, not an error. Generation failures
/// degrade to the fixed fallback per record and never abort the run.
pub async fn prepare_due_reminders(
    store: &CsvStore,
    generator: &dyn TextGenerator,
    config: &Config,
    today: NaiveDate,
) -> Result<Vec<PreparedReminder>, StoreError> {
    let records = store.load()?.into_records();
    let due = due_on(&records, today);
    tracing::debug!(total = records.len(), due = due.len(), "selected due records");

    let mut prepared = Vec::with_capacity(due.len());
    for record in due {
        let mut message = compose(
            generator,
            ComposeRequest {
                record,
                tone: config.tone,
                max_words: config.max_words,
                merchant_name: config.merchant.name.as_deref(),
            },
        )
        .await;

        if let Some(upi_id) = config.merchant.upi_id.as_deref()
            && let Some(link) = payment_link(upi_id, config.merchant.name.as_deref().unwrap_or(""))
        {
            message = append_payment_section(&message, &link);
        }

        let wa_link = message_link(&record.phone, &message);
        prepared.push(PreparedReminder {
            name: record.name.clone(),
            phone: record.phone.clone(),
            message,
            wa_link,
        });
    }

    Ok(prepared)
}
