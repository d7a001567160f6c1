//! Text rendering of amounts, transactions and the summary report.

use crate::amount::Amount;
use crate::event::Event;
use crate::transaction::TransactionState;

/// Formats an amount as `$<n>` or `-$<n>`.
pub fn format_amount(amount: Amount) -> String {
    amount.to_string()
}

/// Formats one transaction line.
///
/// Pending transactions show the initiating time only; finalized ones also
/// show when they were finalized.
pub fn format_summary(txn: &TransactionState) -> String {
    let line = format!(
        "{}: {} @ time {}",
        txn.txn_id,
        format_amount(txn.amount),
        txn.event_time
    );

    if txn.is_pending() {
        return line;
    }

    format!(
        "{} (finalized @ time {})",
        line,
        txn.event_time_finalized.unwrap_or_default()
    )
}

/// Builds the full text report.
///
/// The credit and balance lines use [`format_amount`], so a negative value
/// renders as `-$20` rather than the `$-20` a plain `$` prefix would give.
///
/// The output carries no trailing newline after the last settled line. With
/// no settled transactions it ends with the `Settled transactions:` header
/// and its newline.
pub fn build_output(
    available_credit: Amount,
    payable_balance: Amount,
    pending: &[TransactionState],
    settled: &[TransactionState],
) -> String {
    let mut output = format!(
        "Available credit: {}\nPayable balance: {}\n\n",
        format_amount(available_credit),
        format_amount(payable_balance)
    );

    output.push_str("Pending transactions:\n");
    for txn in pending {
        output.push_str(&format_summary(txn));
        output.push('\n');
    }
    output.push('\n');

    output.push_str("Settled transactions:\n");
    let settled_lines: Vec<String> = settled.iter().map(format_summary).collect();
    output.push_str(&settled_lines.join("\n"));

    output
}

/// Formats one event of the history view.
pub fn format_event(event: &Event) -> String {
    let line = format!("{} for event {}", event.event_type(), event.txn_id);
    match event.amount() {
        Some(amount) => format!("{} with amount {}", line, format_amount(amount)),
        None => line,
    }
}

/// Builds the numbered event history, one event per line.
pub fn build_history(events: &[Event]) -> String {
    events
        .iter()
        .enumerate()
        .map(|(i, event)| format!("{}. {}", i + 1, format_event(event)))
        .collect::<Vec<_>>()
        .join("\n")
}
