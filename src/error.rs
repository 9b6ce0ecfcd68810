//! Error types, one enum per pipeline concern.
//!
//! Every failure is scoped to a single record or a single precondition
//! check; nothing here is fatal to the process itself.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration resolution failures. Raised before any record processing
/// begins; never mid-batch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("missing required configuration {key}: {hint}")]
    Missing { key: String, hint: String },
}

/// Client-table persistence failures.
///
/// A missing backing file is *not* an error — `LoadOutcome::Missing` covers
/// that. These variants mean the file exists but could not be used.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read client table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write client table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed client table {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("row {row}: invalid {column} value '{value}': {message}")]
    InvalidField {
        row: usize,
        column: &'static str,
        value: String,
        message: String,
    },
}

/// Failures from the text-generation call. Callers recover locally via the
/// fixed fallback template; these never surface as hard per-record errors.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation request failed: {0}")]
    Request(String),

    #[error("text generation returned an unusable response: {0}")]
    BadResponse(String),
}

/// Automated-send failures. Reported per record; the batch continues.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("browser automation failed: {0}")]
    Automation(String),

    #[error("messaging surface did not become ready within {0:?}")]
    SurfaceTimeout(Duration),
}
