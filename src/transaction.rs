//! Derived per-transaction state.

use crate::amount::Amount;
use crate::event::EventType;
use serde::Serialize;

/// Lifecycle stage of an open transaction.
///
/// Cleared and canceled transactions have no stage: they are dropped from
/// the fold entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TxnStage {
    /// Authorization hold, not yet settled
    #[serde(rename = "TXN_AUTHED")]
    Authed,
    /// Settled charge
    #[serde(rename = "TXN_SETTLED")]
    Settled,
    /// Payment in flight
    #[serde(rename = "PAYMENT_INITIATED")]
    Initiated,
    /// Posted payment
    #[serde(rename = "PAYMENT_POSTED")]
    Posted,
}

impl TxnStage {
    /// Pending stages are the ones still waiting for a finalizing event.
    pub fn is_pending(&self) -> bool {
        matches!(self, TxnStage::Authed | TxnStage::Initiated)
    }

    /// The event type that moves a transaction into this stage.
    pub fn event_type(&self) -> EventType {
        match self {
            TxnStage::Authed => EventType::TxnAuthed,
            TxnStage::Settled => EventType::TxnSettled,
            TxnStage::Initiated => EventType::PaymentInitiated,
            TxnStage::Posted => EventType::PaymentPosted,
        }
    }
}

/// State of one transaction after folding its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionState {
    /// Transaction identifier
    pub txn_id: String,

    /// Current lifecycle stage
    #[serde(rename = "eventType")]
    pub stage: TxnStage,

    /// Time of the initiating event
    pub event_time: i64,

    /// Time of settlement or posting; `None` while pending
    pub event_time_finalized: Option<i64>,

    /// Current amount (replaced on settlement)
    pub amount: Amount,

    /// Arrival order of the initiating event, used to break sort ties
    #[serde(skip)]
    pub(crate) sequence: usize,
}

impl TransactionState {
    /// Opens a transaction from its initiating event.
    pub fn open(
        txn_id: impl Into<String>,
        stage: TxnStage,
        event_time: i64,
        amount: Amount,
    ) -> Self {
        TransactionState {
            txn_id: txn_id.into(),
            stage,
            event_time,
            event_time_finalized: None,
            amount,
            sequence: 0,
        }
    }

    /// Moves the transaction to a finalized stage.
    ///
    /// A new amount is only supplied by settlement; posting keeps the
    /// initiated amount.
    pub fn finalize(&mut self, stage: TxnStage, event_time: i64, amount: Option<Amount>) {
        self.stage = stage;
        self.event_time_finalized = Some(event_time);
        if let Some(amount) = amount {
            self.amount = amount;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.stage.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_is_pending() {
        let state = TransactionState::open("t1", TxnStage::Authed, 1, Amount::new(123));
        assert!(state.is_pending());
        assert_eq!(state.event_time_finalized, None);
    }

    #[test]
    fn test_settlement_replaces_amount() {
        let mut state = TransactionState::open("t1", TxnStage::Authed, 1, Amount::new(123));
        state.finalize(TxnStage::Settled, 2, Some(Amount::new(456)));

        assert!(!state.is_pending());
        assert_eq!(state.stage, TxnStage::Settled);
        assert_eq!(state.event_time, 1);
        assert_eq!(state.event_time_finalized, Some(2));
        assert_eq!(state.amount, Amount::new(456));
    }

    #[test]
    fn test_posting_keeps_amount() {
        let mut state = TransactionState::open("p1", TxnStage::Initiated, 3, Amount::new(-50));
        state.finalize(TxnStage::Posted, 5, None);

        assert_eq!(state.stage, TxnStage::Posted);
        assert_eq!(state.amount, Amount::new(-50));
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let state = TransactionState::open("p1", TxnStage::Initiated, 3, Amount::new(-50));
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["txnId"], "p1");
        assert_eq!(json["eventType"], "PAYMENT_INITIATED");
        assert_eq!(json["eventTime"], 3);
        assert_eq!(json["amount"], -50);
        assert!(json["eventTimeFinalized"].is_null());
        assert!(json.get("sequence").is_none());
    }
}
