//! Append-only event log backed by a CSV file.
//!
//! Rows are never rewritten or removed. Submissions are validated against a
//! full replay of the log before they are appended, so a rejected event
//! never reaches the file.

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::event::{Event, EventRecord, EventType};
use crate::reducer::{summarize_with, ReducerPolicy, Summary};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, info};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Transaction ids that can still be targeted by a finalizing event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenIds {
    /// Card transactions (`t` prefix)
    pub transactions: Vec<String>,

    /// Payments (`p` prefix)
    pub payments: Vec<String>,
}

/// A new event as collected from the user, before id assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub event_type: EventType,
    pub event_time: i64,
    pub txn_id: Option<String>,
    pub amount: Option<Amount>,
}

/// CSV event log with header `eventType,eventTime,txnId,amount`.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Points at a log file. The file is created on the first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        EventLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored record in append order.
    pub fn records(&self) -> Result<Vec<EventRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for result in reader.deserialize::<EventRecord>() {
            records.push(result?);
        }
        Ok(records)
    }

    /// Returns all events ordered by event time. Events with equal times keep
    /// their append order.
    pub fn list_all(&self) -> Result<Vec<Event>> {
        let mut events = self
            .records()?
            .iter()
            .enumerate()
            .map(|(row_idx, record)| {
                record.parse().map_err(|e| LedgerError::InvalidRecord {
                    row: row_idx + 2, // 1-indexed, accounting for header row
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        events.sort_by_key(|e| e.event_time);
        Ok(events)
    }

    /// Appends one event without validation against the rest of the log.
    pub fn append(&self, event: &Event) -> Result<()> {
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(event.to_record())?;
        writer.flush()?;

        info!(
            "Appended {} for {} at time {} to {}",
            event.event_type(),
            event.txn_id,
            event.event_time,
            self.path.display()
        );
        Ok(())
    }

    /// Folds the whole log into a summary.
    pub fn summarize(&self, credit_limit: Amount, policy: ReducerPolicy) -> Result<Summary> {
        summarize_with(credit_limit, &self.list_all()?, policy)
    }

    /// Next id for a newly opened transaction: `<prefix><count>`, where count
    /// is the number of distinct ids in the log with that prefix. If that id
    /// was already taken by an explicitly supplied one, the count is bumped
    /// until a free id is found.
    pub fn next_txn_id(&self, prefix: &str) -> Result<String> {
        let taken = self.txn_ids()?;
        let mut count = taken.iter().filter(|id| id.starts_with(prefix)).count();
        loop {
            let candidate = format!("{}{}", prefix, count);
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
            count += 1;
        }
    }

    /// Every distinct transaction id that appears in the log.
    fn txn_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .records()?
            .into_iter()
            .filter_map(|r| r.txn_id)
            .collect())
    }

    /// Ids that were never cleared or canceled, split by prefix, in order of
    /// first appearance.
    pub fn open_ids(&self) -> Result<OpenIds> {
        let events = self.list_all()?;

        let closed: HashSet<&str> = events
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type(),
                    EventType::TxnAuthCleared | EventType::PaymentCanceled
                )
            })
            .map(|e| e.txn_id.as_str())
            .collect();

        let mut seen = HashSet::new();
        let mut open = OpenIds::default();
        for event in &events {
            let id = event.txn_id.as_str();
            if closed.contains(id) || !seen.insert(id) {
                continue;
            }
            if id.starts_with('t') {
                open.transactions.push(id.to_string());
            } else if id.starts_with('p') {
                open.payments.push(id.to_string());
            }
        }
        Ok(open)
    }

    /// Validates a submission and appends it.
    ///
    /// The candidate is replayed together with the existing log; if the
    /// replay fails the log is left untouched and the error is returned.
    pub fn submit(
        &self,
        submission: Submission,
        credit_limit: Amount,
        policy: ReducerPolicy,
    ) -> Result<Event> {
        let event = self.build_event(submission)?;

        let mut events = self.list_all()?;
        let position = events.partition_point(|e| e.event_time <= event.event_time);
        events.insert(position, event.clone());
        summarize_with(credit_limit, &events, policy)?;

        debug!(
            "Submission {} for {} validated against {} stored events",
            event.event_type(),
            event.txn_id,
            events.len() - 1
        );

        self.append(&event)?;
        Ok(event)
    }

    fn build_event(&self, submission: Submission) -> Result<Event> {
        let event_type = submission.event_type;
        let txn_id = submission
            .txn_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let txn_id = match txn_id {
            Some(id) if event_type.is_initiating() && self.txn_ids()?.contains(&id) => {
                return Err(LedgerError::validation(format!(
                    "Transaction id {} is already in use",
                    id
                )));
            }
            Some(id) => id,
            None if event_type.is_initiating() => self.next_txn_id(event_type.id_prefix())?,
            None => {
                return Err(LedgerError::validation("Must provide a valid transaction id!"));
            }
        };

        let amount = if event_type.carries_amount() {
            submission.amount
        } else {
            None
        };

        EventRecord {
            event_type: event_type.to_string(),
            event_time: submission.event_time,
            txn_id: Some(txn_id),
            amount,
        }
        .parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use tempfile::TempDir;

    fn temp_log() -> (TempDir, EventLog) {
        let dir = TempDir::new().unwrap();
        let log = EventLog::open(dir.path().join("events.csv"));
        (dir, log)
    }

    fn submission(event_type: EventType, time: i64, id: Option<&str>, amount: Option<i64>) -> Submission {
        Submission {
            event_type,
            event_time: time,
            txn_id: id.map(str::to_string),
            amount: amount.map(Amount::new),
        }
    }

    fn submit(log: &EventLog, s: Submission) -> Result<Event> {
        log.submit(s, Amount::new(1000), ReducerPolicy::Strict)
    }

    #[test]
    fn test_missing_file_is_empty_log() {
        let (_dir, log) = temp_log();
        assert!(log.list_all().unwrap().is_empty());
        assert_eq!(log.next_txn_id("t").unwrap(), "t0");
    }

    #[test]
    fn test_append_writes_header_once() {
        let (_dir, log) = temp_log();
        log.append(&Event::new(1, "t0", EventKind::TxnAuthed(Amount::new(10))))
            .unwrap();
        log.append(&Event::new(2, "t0", EventKind::TxnAuthCleared))
            .unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            "eventType,eventTime,txnId,amount\nTXN_AUTHED,1,t0,10\nTXN_AUTH_CLEARED,2,t0,\n"
        );
    }

    #[test]
    fn test_list_all_sorts_by_time_stably() {
        let (_dir, log) = temp_log();
        log.append(&Event::new(5, "t0", EventKind::TxnAuthed(Amount::new(10))))
            .unwrap();
        log.append(&Event::new(2, "t1", EventKind::TxnAuthed(Amount::new(20))))
            .unwrap();
        log.append(&Event::new(2, "t2", EventKind::TxnAuthed(Amount::new(30))))
            .unwrap();

        let ids: Vec<String> = log.list_all().unwrap().into_iter().map(|e| e.txn_id).collect();
        assert_eq!(ids, ["t1", "t2", "t0"]);
    }

    #[test]
    fn test_submit_assigns_ids_by_prefix() {
        let (_dir, log) = temp_log();

        let t0 = submit(&log, submission(EventType::TxnAuthed, 1, None, Some(100))).unwrap();
        let p0 = submit(&log, submission(EventType::PaymentInitiated, 2, None, Some(-50))).unwrap();
        let t1 = submit(&log, submission(EventType::TxnAuthed, 3, None, Some(20))).unwrap();

        assert_eq!(t0.txn_id, "t0");
        assert_eq!(p0.txn_id, "p0");
        assert_eq!(t1.txn_id, "t1");
        assert_eq!(log.next_txn_id("t").unwrap(), "t2");
        assert_eq!(log.next_txn_id("p").unwrap(), "p1");
    }

    #[test]
    fn test_next_id_skips_explicitly_taken_ids() {
        let (_dir, log) = temp_log();
        submit(&log, submission(EventType::TxnAuthed, 1, None, Some(10))).unwrap();
        submit(&log, submission(EventType::TxnAuthed, 2, Some("t2"), Some(500))).unwrap();

        let auto = submit(&log, submission(EventType::TxnAuthed, 3, None, Some(1))).unwrap();
        assert_eq!(auto.txn_id, "t3");

        let summary = log.summarize(Amount::new(1000), ReducerPolicy::Strict).unwrap();
        assert_eq!(summary.pending_transactions.len(), 3);
        assert_eq!(summary.available_credit, Amount::new(489));
    }

    #[test]
    fn test_submit_rejects_reused_id_on_initiating_event() {
        let (_dir, log) = temp_log();
        submit(&log, submission(EventType::TxnAuthed, 1, None, Some(10))).unwrap();

        let err = submit(&log, submission(EventType::TxnAuthed, 2, Some("t0"), Some(500))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid event: Transaction id t0 is already in use");
        assert_eq!(log.list_all().unwrap().len(), 1);

        // Cleared ids stay taken as well
        submit(&log, submission(EventType::TxnAuthCleared, 3, Some("t0"), None)).unwrap();
        let err = submit(&log, submission(EventType::TxnAuthed, 4, Some("t0"), Some(5))).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }

    #[test]
    fn test_submit_rejects_finalizing_event_without_id() {
        let (_dir, log) = temp_log();
        submit(&log, submission(EventType::TxnAuthed, 1, None, Some(100))).unwrap();

        let err = submit(&log, submission(EventType::TxnSettled, 2, None, Some(90))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid event: Must provide a valid transaction id!");
        assert_eq!(log.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_submit_rejects_unknown_transaction_without_appending() {
        let (_dir, log) = temp_log();
        submit(&log, submission(EventType::TxnAuthed, 1, None, Some(100))).unwrap();

        let err = submit(&log, submission(EventType::PaymentPosted, 2, Some("p7"), None)).unwrap_err();
        assert!(matches!(err, LedgerError::MissingTransaction { .. }));
        assert_eq!(log.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_submit_rejects_event_that_breaks_later_history() {
        let (_dir, log) = temp_log();
        submit(&log, submission(EventType::TxnAuthed, 1, None, Some(100))).unwrap();
        submit(&log, submission(EventType::TxnSettled, 5, Some("t0"), Some(100))).unwrap();

        // Clearing before the settlement would leave the settlement dangling
        let err = submit(&log, submission(EventType::TxnAuthCleared, 3, Some("t0"), None)).unwrap_err();
        assert!(matches!(err, LedgerError::MissingTransaction { .. }));
        assert_eq!(log.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_submit_drops_amount_on_amountless_events() {
        let (_dir, log) = temp_log();
        submit(&log, submission(EventType::PaymentInitiated, 1, None, Some(-30))).unwrap();
        let posted = submit(&log, submission(EventType::PaymentPosted, 2, Some("p0"), Some(999))).unwrap();

        assert_eq!(posted.amount(), None);
        let summary = log.summarize(Amount::new(1000), ReducerPolicy::Strict).unwrap();
        assert_eq!(summary.payable_balance, Amount::new(-30));
        assert_eq!(summary.available_credit, Amount::new(1030));
    }

    #[test]
    fn test_submit_requires_amount_for_authorization() {
        let (_dir, log) = temp_log();
        let err = submit(&log, submission(EventType::TxnAuthed, 1, None, None)).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert!(!log.path().exists());
    }

    #[test]
    fn test_open_ids_exclude_cleared_and_canceled() {
        let (_dir, log) = temp_log();
        submit(&log, submission(EventType::TxnAuthed, 1, None, Some(10))).unwrap();
        submit(&log, submission(EventType::TxnAuthed, 2, None, Some(20))).unwrap();
        submit(&log, submission(EventType::PaymentInitiated, 3, None, Some(-5))).unwrap();
        submit(&log, submission(EventType::PaymentInitiated, 4, None, Some(-6))).unwrap();
        submit(&log, submission(EventType::TxnAuthCleared, 5, Some("t0"), None)).unwrap();
        submit(&log, submission(EventType::PaymentCanceled, 6, Some("p1"), None)).unwrap();
        submit(&log, submission(EventType::TxnSettled, 7, Some("t1"), Some(20))).unwrap();

        let open = log.open_ids().unwrap();
        assert_eq!(open.transactions, ["t1"]);
        assert_eq!(open.payments, ["p0"]);

        // Cleared ids still count toward the next assigned id
        assert_eq!(log.next_txn_id("t").unwrap(), "t2");
    }

    #[test]
    fn test_corrupt_row_reports_row_number() {
        let (_dir, log) = temp_log();
        fs::write(
            log.path(),
            "eventType,eventTime,txnId,amount\nTXN_AUTHED,1,t0,10\nTXN_SETTLED,2,,5\n",
        )
        .unwrap();

        let err = log.list_all().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRecord { row: 3, .. }));
    }
}
