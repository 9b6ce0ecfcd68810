//! Reminder composition.
//!
//! Builds the generation prompt from a client record, invokes the text
//! generator, and falls back deterministically when the call fails. Output is
//! requested-tone, requested-length text — never validated or truncated.

pub mod gemini;
mod tone;

pub use gemini::{GeminiClient, TextGenerator};
pub use tone::Tone;

use rust_decimal::Decimal;

use crate::store::{ClientRecord, format_due_date};

/// Everything the composer needs for one record, owned by the caller — no
/// process-wide state.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    pub record: &'a ClientRecord,
    pub tone: Tone,
    /// Requested word cap; not enforced on the output.
    pub max_words: u16,
    pub merchant_name: Option<&'a str>,
}

/// Build the single-prompt instruction for the generator.
pub fn build_prompt(req: &ComposeRequest<'_>) -> String {
    let record = req.record;
    let mut prompt = format!(
        "Write a payment reminder message for {}. Tone: {}. Maximum {} words. No placeholders.",
        record.name,
        req.tone.as_str(),
        req.max_words
    );

    if record.advance > Decimal::ZERO {
        prompt.push_str(&format!(
            " They have already paid an advance of {}.",
            record.advance
        ));
    }
    if let Some(due) = record.due_date {
        prompt.push_str(&format!(" The payment is due on {}.", format_due_date(due)));
    }
    if !record.offer.trim().is_empty() {
        prompt.push_str(&format!(" Mention this offer: {}.", record.offer.trim()));
    }
    if let Some(merchant) = req.merchant_name {
        prompt.push_str(&format!(" Send it on behalf of {merchant}."));
    }

    prompt
}

/// The fixed template used when generation fails. Never fails or blocks.
pub fn fallback_message(record: &ClientRecord) -> String {
    match record.due_date {
        Some(due) => format!(
            "Hello {}, payment reminder. Due: {}",
            record.name,
            format_due_date(due)
        ),
        None => format!("Hello {}, payment reminder.", record.name),
    }
}

/// Compose the reminder text for one record. Generation failures recover
/// locally via [`fallback_message`]; this function itself cannot fail.
pub async fn compose(generator: &dyn TextGenerator, req: ComposeRequest<'_>) -> String {
    let prompt = build_prompt(&req);
    match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(client = %req.record.name, error = %e, "generation failed, using fallback");
            fallback_message(req.record)
        }
    }
}
