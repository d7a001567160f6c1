//! Event reduction: folds an ordered event stream into balances and
//! classified transaction lists.
//!
//! Events are applied in the order they are received, which is assumed to be
//! ascending by event time. Each reduction owns its own transaction map; no
//! state survives a call to [`summarize`].

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::event::{Event, EventKind};
use crate::report;
use crate::transaction::{TransactionState, TxnStage};
use log::{debug, warn};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

/// How the reducer treats events that do not line up with the open
/// transactions.
///
/// Settlement or posting of an unknown transaction is rejected under both
/// policies; the policy only governs clearing/cancellation of unknown
/// transactions and out-of-order event times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReducerPolicy {
    /// Reject anything that does not reference an open transaction or that
    /// arrives with an earlier time than its predecessor.
    #[default]
    Strict,

    /// Log such events at warn level and keep going.
    Lenient,
}

/// Aggregate balances and classified transactions derived from an event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Credit limit minus every open or settled charge and posted payment.
    pub available_credit: Amount,

    /// Settled charges plus pending and posted payments.
    pub payable_balance: Amount,

    /// Authorized charges and initiated payments, newest first.
    pub pending_transactions: Vec<TransactionState>,

    /// Settled charges and posted payments, newest first.
    pub settled_transactions: Vec<TransactionState>,
}

impl Summary {
    /// Renders the fixed-format text report.
    pub fn render(&self) -> String {
        report::build_output(
            self.available_credit,
            self.payable_balance,
            &self.pending_transactions,
            &self.settled_transactions,
        )
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Folds events into a summary.
///
/// This is the one-shot entry point: a fresh [`EventReducer`] is built for
/// every call.
///
/// # Example
///
/// ```
/// use credit_summarizer::{summarize, Amount, Event, EventKind};
///
/// let events = vec![
///     Event::new(1, "t1", EventKind::TxnAuthed(Amount::new(123))),
///     Event::new(2, "t1", EventKind::TxnSettled(Amount::new(456))),
///     Event::new(3, "p1", EventKind::PaymentInitiated(Amount::new(-456))),
/// ];
///
/// let summary = summarize(Amount::new(1000), &events).unwrap();
/// assert_eq!(summary.available_credit, Amount::new(544));
/// assert_eq!(summary.payable_balance, Amount::ZERO);
/// ```
pub fn summarize(credit_limit: Amount, events: &[Event]) -> Result<Summary> {
    summarize_with(credit_limit, events, ReducerPolicy::default())
}

/// Like [`summarize`], with an explicit policy.
pub fn summarize_with(
    credit_limit: Amount,
    events: &[Event],
    policy: ReducerPolicy,
) -> Result<Summary> {
    let mut reducer = EventReducer::new(policy);
    for event in events {
        reducer.apply(event)?;
    }
    reducer.finish(credit_limit)
}

/// Incremental event fold.
///
/// Holds at most one [`TransactionState`] per transaction id. An event that
/// fails validation leaves the reducer exactly as it was.
pub struct EventReducer {
    policy: ReducerPolicy,

    /// Open transactions indexed by transaction id.
    transactions: HashMap<String, TransactionState>,

    /// Time of the last applied event, for the ordering check.
    last_event_time: Option<i64>,

    /// Arrival counter stamped onto opened transactions.
    next_sequence: usize,
}

impl EventReducer {
    /// Creates an empty reducer.
    pub fn new(policy: ReducerPolicy) -> Self {
        EventReducer {
            policy,
            transactions: HashMap::new(),
            last_event_time: None,
            next_sequence: 0,
        }
    }

    /// Applies a single event.
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        self.check_order(event)?;

        match event.kind {
            EventKind::TxnAuthed(amount) => self.open(event, TxnStage::Authed, amount),
            EventKind::PaymentInitiated(amount) => self.open(event, TxnStage::Initiated, amount),
            EventKind::TxnSettled(amount) => {
                self.finalize(event, TxnStage::Settled, Some(amount))?
            }
            EventKind::PaymentPosted => self.finalize(event, TxnStage::Posted, None)?,
            EventKind::TxnAuthCleared | EventKind::PaymentCanceled => self.remove(event)?,
        }

        self.last_event_time = Some(event.event_time);
        Ok(())
    }

    /// Number of transactions currently open (pending or finalized).
    pub fn open_count(&self) -> usize {
        self.transactions.len()
    }

    /// Classifies the surviving transactions and computes the balances.
    ///
    /// Fails with [`LedgerError::Overflow`] if either balance leaves the
    /// `i64` range.
    pub fn finish(self, credit_limit: Amount) -> Result<Summary> {
        let mut available_credit = credit_limit;
        let mut payable_balance = Amount::ZERO;
        let mut pending_transactions = Vec::new();
        let mut settled_transactions = Vec::new();

        for txn in self.transactions.into_values() {
            let (affects_credit, affects_balance) = match txn.stage {
                TxnStage::Authed => (true, false),
                TxnStage::Settled | TxnStage::Posted => (true, true),
                TxnStage::Initiated => (false, true),
            };

            if affects_credit {
                available_credit = available_credit
                    .checked_sub(txn.amount)
                    .ok_or_else(|| overflow(&txn))?;
            }
            if affects_balance {
                payable_balance = payable_balance
                    .checked_add(txn.amount)
                    .ok_or_else(|| overflow(&txn))?;
            }

            if txn.is_pending() {
                pending_transactions.push(txn);
            } else {
                settled_transactions.push(txn);
            }
        }

        // Newest initiating event first; ties keep arrival order
        pending_transactions.sort_by_key(|t| (Reverse(t.event_time), t.sequence));
        settled_transactions.sort_by_key(|t| (Reverse(t.event_time), t.sequence));

        Ok(Summary {
            available_credit,
            payable_balance,
            pending_transactions,
            settled_transactions,
        })
    }

    fn check_order(&self, event: &Event) -> Result<()> {
        let previous = match self.last_event_time {
            Some(previous) if event.event_time < previous => previous,
            _ => return Ok(()),
        };

        match self.policy {
            ReducerPolicy::Strict => Err(LedgerError::OutOfOrder {
                txn_id: event.txn_id.clone(),
                event_time: event.event_time,
                previous,
            }),
            ReducerPolicy::Lenient => {
                warn!(
                    "{} for {} at time {} arrived after time {}, applying in arrival order",
                    event.event_type(),
                    event.txn_id,
                    event.event_time,
                    previous
                );
                Ok(())
            }
        }
    }

    /// Opens a transaction, replacing any previous state under the same id.
    fn open(&mut self, event: &Event, stage: TxnStage, amount: Amount) {
        let mut state = TransactionState::open(&event.txn_id, stage, event.event_time, amount);
        state.sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.transactions.insert(event.txn_id.clone(), state).is_some() {
            debug!(
                "Time {}: {} reopened transaction {}, previous state replaced",
                event.event_time,
                event.event_type(),
                event.txn_id
            );
        } else {
            debug!(
                "Time {}: Opened {} for {}",
                event.event_time, event.txn_id, amount
            );
        }
    }

    fn finalize(&mut self, event: &Event, stage: TxnStage, amount: Option<Amount>) -> Result<()> {
        let state = self
            .transactions
            .get_mut(&event.txn_id)
            .ok_or_else(|| missing_transaction(event))?;

        state.finalize(stage, event.event_time, amount);

        debug!(
            "Time {}: {} finalized {} at {}",
            event.event_time,
            event.event_type(),
            event.txn_id,
            state.amount
        );
        Ok(())
    }

    fn remove(&mut self, event: &Event) -> Result<()> {
        if self.transactions.remove(&event.txn_id).is_some() {
            debug!(
                "Time {}: {} removed {}",
                event.event_time,
                event.event_type(),
                event.txn_id
            );
            return Ok(());
        }

        match self.policy {
            ReducerPolicy::Strict => Err(missing_transaction(event)),
            ReducerPolicy::Lenient => {
                warn!(
                    "Time {}: {} references unknown transaction {}, ignoring",
                    event.event_time,
                    event.event_type(),
                    event.txn_id
                );
                Ok(())
            }
        }
    }
}

impl Default for EventReducer {
    fn default() -> Self {
        Self::new(ReducerPolicy::default())
    }
}

fn overflow(txn: &TransactionState) -> LedgerError {
    LedgerError::Overflow {
        txn_id: txn.txn_id.clone(),
        amount: txn.amount,
    }
}

fn missing_transaction(event: &Event) -> LedgerError {
    LedgerError::MissingTransaction {
        event_type: event.event_type().to_string(),
        txn_id: event.txn_id.clone(),
        event_time: event.event_time,
    }
}
