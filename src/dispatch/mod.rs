//! Outbound message dispatch.
//!
//! Two mutually exclusive modes, selected by configuration: deep-link mode
//! hands the operator a `wa.me` link to click, automated mode drives a
//! WhatsApp Web session one record at a time. Per-record state:
//!
//! ```text
//! Pending → Sending → { Sent | Failed }
//! ```
//!
//! `Failed` is terminal for the run; a failure is reported and the batch
//! continues with the next record.

pub mod automation;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::pipeline::PreparedReminder;

/// How composed reminders leave the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    DeepLink,
    Automated,
}

impl DispatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeepLink => "deep-link",
            Self::Automated => "automated",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "deep-link" | "deeplink" => Some(Self::DeepLink),
            "automated" => Some(Self::Automated),
            _ => None,
        }
    }
}

/// Pacing for automated sends. The right wait is a property of the
/// automation target's load time, so both intervals are configurable rather
/// than constants.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// How long to allow WhatsApp Web to become ready before a send.
    pub surface_load: Duration,
    /// Pause between consecutive sends.
    pub between_sends: Duration,
}

/// Per-record send lifecycle. No transition back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Pending,
    Sending,
    Sent,
    Failed,
}

impl SendState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one record's send attempt.
#[derive(Debug, Clone)]
pub struct SendReport {
    pub name: String,
    pub phone: String,
    pub state: SendState,
    pub detail: Option<String>,
}

/// Seam over the automation surface so the batch loop is testable without a
/// browser.
#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send(&self, phone: &str, text: &str) -> Result<(), DispatchError>;
}

/// Send reminders sequentially, pausing between consecutive sends. A failed
/// record is reported and the loop moves on — no abort, no retry.
pub async fn send_batch(
    sender: &dyn ReminderSender,
    reminders: &[PreparedReminder],
    pacing: &PacingConfig,
) -> Vec<SendReport> {
    let mut reports = Vec::with_capacity(reminders.len());

    for (index, reminder) in reminders.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(pacing.between_sends).await;
        }

        tracing::info!(client = %reminder.name, phone = %reminder.phone, "sending reminder");
        let report = match sender.send(&reminder.phone, &reminder.message).await {
            Ok(()) => SendReport {
                name: reminder.name.clone(),
                phone: reminder.phone.clone(),
                state: SendState::Sent,
                detail: None,
            },
            Err(e) => {
                tracing::warn!(client = %reminder.name, error = %e, "send failed, continuing");
                SendReport {
                    name: reminder.name.clone(),
                    phone: reminder.phone.clone(),
                    state: SendState::Failed,
                    detail: Some(e.to_string()),
                }
            }
        };
        reports.push(report);
    }

    reports
}
