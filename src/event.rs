//! Lifecycle event models for parsing and internal representation.

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six lifecycle event kinds, as they are spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    TxnAuthed,
    TxnSettled,
    TxnAuthCleared,
    PaymentInitiated,
    PaymentPosted,
    PaymentCanceled,
}

impl EventType {
    /// Every event type, in the order a submission form lists them.
    pub const ALL: [EventType; 6] = [
        EventType::TxnAuthed,
        EventType::PaymentInitiated,
        EventType::PaymentPosted,
        EventType::TxnSettled,
        EventType::TxnAuthCleared,
        EventType::PaymentCanceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TxnAuthed => "TXN_AUTHED",
            EventType::TxnSettled => "TXN_SETTLED",
            EventType::TxnAuthCleared => "TXN_AUTH_CLEARED",
            EventType::PaymentInitiated => "PAYMENT_INITIATED",
            EventType::PaymentPosted => "PAYMENT_POSTED",
            EventType::PaymentCanceled => "PAYMENT_CANCELED",
        }
    }

    /// Events that open a new transaction.
    pub fn is_initiating(&self) -> bool {
        matches!(self, EventType::TxnAuthed | EventType::PaymentInitiated)
    }

    /// Events that must reference an already opened transaction.
    pub fn is_finalizing(&self) -> bool {
        !self.is_initiating()
    }

    /// Events whose amount field is meaningful.
    pub fn carries_amount(&self) -> bool {
        matches!(
            self,
            EventType::TxnAuthed | EventType::TxnSettled | EventType::PaymentInitiated
        )
    }

    /// Prefix used when auto-assigning ids to newly opened transactions.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EventType::TxnAuthed | EventType::TxnSettled | EventType::TxnAuthCleared => "t",
            EventType::PaymentInitiated
            | EventType::PaymentPosted
            | EventType::PaymentCanceled => "p",
        }
    }
}

impl FromStr for EventType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or(LedgerError::UnknownEventType {
                value: s.trim().to_string(),
            })
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw event record as read from a JSON document or the CSV event log.
///
/// The event type stays a string here so that unknown kinds surface as a
/// typed error from [`EventRecord::parse`] instead of a serde failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// One of the six lifecycle event names
    pub event_type: String,

    /// Logical clock used for ordering
    pub event_time: i64,

    /// Transaction identifier
    #[serde(default)]
    pub txn_id: Option<String>,

    /// Amount (absent on clearing, cancellation and posting events)
    #[serde(default)]
    pub amount: Option<Amount>,
}

impl EventRecord {
    /// Validates the raw record into a typed event.
    pub fn parse(&self) -> Result<Event> {
        let event_type: EventType = self.event_type.parse()?;

        let txn_id = match self.txn_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ if event_type.is_finalizing() => {
                return Err(LedgerError::validation("Must provide a valid transaction id!"));
            }
            _ => {
                return Err(LedgerError::validation(format!(
                    "{} at time {} has no transaction id",
                    event_type, self.event_time
                )));
            }
        };

        let kind = match event_type {
            EventType::TxnAuthed => EventKind::TxnAuthed(self.require_amount(event_type, &txn_id)?),
            EventType::TxnSettled => {
                EventKind::TxnSettled(self.require_amount(event_type, &txn_id)?)
            }
            EventType::PaymentInitiated => {
                EventKind::PaymentInitiated(self.require_amount(event_type, &txn_id)?)
            }
            EventType::TxnAuthCleared => EventKind::TxnAuthCleared,
            EventType::PaymentPosted => EventKind::PaymentPosted,
            EventType::PaymentCanceled => EventKind::PaymentCanceled,
        };

        Ok(Event {
            event_time: self.event_time,
            txn_id,
            kind,
        })
    }

    fn require_amount(&self, event_type: EventType, txn_id: &str) -> Result<Amount> {
        self.amount.ok_or_else(|| {
            LedgerError::validation(format!(
                "{} for {} at time {} is missing an amount",
                event_type, txn_id, self.event_time
            ))
        })
    }
}

/// A parsed and validated event ready for reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Logical clock of the event
    pub event_time: i64,

    /// Transaction the event belongs to
    pub txn_id: String,

    /// Event kind with associated data
    pub kind: EventKind,
}

impl Event {
    pub fn new(event_time: i64, txn_id: impl Into<String>, kind: EventKind) -> Self {
        Event {
            event_time,
            txn_id: txn_id.into(),
            kind,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Amount carried by the event, if its kind has one.
    pub fn amount(&self) -> Option<Amount> {
        match self.kind {
            EventKind::TxnAuthed(amount)
            | EventKind::TxnSettled(amount)
            | EventKind::PaymentInitiated(amount) => Some(amount),
            EventKind::TxnAuthCleared | EventKind::PaymentPosted | EventKind::PaymentCanceled => {
                None
            }
        }
    }

    /// Converts back into the raw shape used for storage.
    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            event_type: self.event_type().to_string(),
            event_time: self.event_time,
            txn_id: Some(self.txn_id.clone()),
            amount: self.amount(),
        }
    }
}

/// Event kinds with associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Charge placed as a hold against available credit.
    TxnAuthed(Amount),

    /// Authorization finalized; the amount replaces the authorized one.
    TxnSettled(Amount),

    /// Authorization reversed before settlement.
    TxnAuthCleared,

    /// Payment started; counts toward the payable balance while pending.
    PaymentInitiated(Amount),

    /// Payment finalized at its initiated amount.
    PaymentPosted,

    /// Payment reversed before posting.
    PaymentCanceled,
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::TxnAuthed(_) => EventType::TxnAuthed,
            EventKind::TxnSettled(_) => EventType::TxnSettled,
            EventKind::TxnAuthCleared => EventType::TxnAuthCleared,
            EventKind::PaymentInitiated(_) => EventType::PaymentInitiated,
            EventKind::PaymentPosted => EventType::PaymentPosted,
            EventKind::PaymentCanceled => EventType::PaymentCanceled,
        }
    }
}
