//! Error types for the credit summarizer.

use crate::amount::Amount;
use thiserror::Error;

/// Result type alias for summarizer operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while reading, validating or reducing events.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event log (CSV) error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input document (JSON) error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored event log row that does not parse into an event
    #[error("Invalid event log record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Event type outside the six known lifecycle events
    #[error("Unknown event type: {value}")]
    UnknownEventType { value: String },

    /// Event rejected before it touched any state
    #[error("Invalid event: {message}")]
    Validation { message: String },

    /// Finalizing event references a transaction that is not open
    #[error("{event_type} at time {event_time} references unknown transaction {txn_id}")]
    MissingTransaction {
        event_type: String,
        txn_id: String,
        event_time: i64,
    },

    /// Balance left the representable range
    #[error("Balance overflow while applying {txn_id} ({amount})")]
    Overflow { txn_id: String, amount: Amount },

    /// Event arrived with an earlier time than its predecessor
    #[error("Event for {txn_id} at time {event_time} arrived after time {previous}")]
    OutOfOrder {
        txn_id: String,
        event_time: i64,
        previous: i64,
    },
}

impl LedgerError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
        }
    }
}
