//! # Credit Summarizer
//!
//! Folds an ordered stream of credit-card lifecycle events (authorizations,
//! settlements, payments, clearings and cancellations) into available credit,
//! payable balance, and pending / settled transaction lists.
//!
//! ## Design Principles
//!
//! - **Exact arithmetic**: amounts are signed integers, never floats
//! - **Pure reduction**: every summary is rebuilt from the event log
//! - **Typed failures**: unknown transactions and malformed events are errors,
//!   never silently dropped
//! - **Deterministic output**: lists sorted newest first, ties in arrival order
//!
//! ## Example
//!
//! ```
//! use credit_summarizer::{ReducerPolicy, SummaryInput};
//!
//! let json = r#"{"creditLimit": 1000, "events": [
//!     {"eventType": "TXN_AUTHED", "eventTime": 1, "txnId": "t1", "amount": 100},
//!     {"eventType": "TXN_AUTH_CLEARED", "eventTime": 2, "txnId": "t1"}
//! ]}"#;
//!
//! let summary = SummaryInput::from_json(json)
//!     .unwrap()
//!     .summarize(ReducerPolicy::Strict)
//!     .unwrap();
//! assert!(summary.render().starts_with("Available credit: $1000\n"));
//! ```

pub mod amount;
pub mod error;
pub mod event;
pub mod input;
pub mod reducer;
pub mod report;
pub mod store;
pub mod transaction;

pub use amount::Amount;
pub use error::{LedgerError, Result};
pub use event::{Event, EventKind, EventRecord, EventType};
pub use input::SummaryInput;
pub use reducer::{summarize, summarize_with, EventReducer, ReducerPolicy, Summary};
pub use report::{build_history, build_output, format_amount, format_event, format_summary};
pub use store::{EventLog, OpenIds, Submission};
pub use transaction::{TransactionState, TxnStage};
