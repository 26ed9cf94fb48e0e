//! The running-balance recomputation pass.
//!
//! The stored `balance` column is derived data: for each account, sorting
//! its transactions by `(date, id)` and prefix-summing signed amounts from
//! zero must reproduce every stored balance. Every mutation that changes the
//! set or order of an account's transactions re-derives the whole column for
//! that account, because each later balance depends on all earlier rows.
//!
//! Callers run this inside the same SQL transaction as the triggering
//! mutation so the batch of balance updates commits atomically with it.

use rusqlite::Connection;

use crate::{
    Error,
    transaction::{
        Transaction, TransactionKind, core::transactions_for_account_ordered,
    },
};

/// The amount of a transaction with its direction applied: positive for
/// income, negative for expenses.
pub fn signed_amount(kind: TransactionKind, amount: i64) -> i64 {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

/// The running balances for a sequence of transactions already in `(date,
/// id)` order, starting from zero.
///
/// Negative totals are allowed; an overdrawn account is not an error.
pub fn running_balances(transactions: &[Transaction]) -> Vec<i64> {
    transactions
        .iter()
        .scan(0i64, |running, transaction| {
            *running += signed_amount(transaction.kind, transaction.amount);
            Some(*running)
        })
        .collect()
}

/// Re-derive and persist the balance of every transaction in `account`.
///
/// Fetches the account's transactions in `(date ASC, id ASC)` order, walks
/// them once with a running total starting at zero, and writes each row's
/// balance. An account with no transactions is a no-op. The pass is
/// idempotent: running it twice on an unchanged account writes the same
/// values both times.
///
/// # Errors
/// Returns an [Error::SqlError] if a read or write fails; the caller's SQL
/// transaction is expected to roll the partial batch back.
pub fn recompute_account_balances(account: &str, connection: &Connection) -> Result<(), Error> {
    let transactions = transactions_for_account_ordered(account, connection)?;

    if transactions.is_empty() {
        return Ok(());
    }

    let balances = running_balances(&transactions);

    let mut statement =
        connection.prepare("UPDATE ledger_entry SET balance = :balance WHERE id = :id")?;

    for (transaction, balance) in transactions.iter().zip(balances) {
        statement.execute(rusqlite::named_params! {
            ":balance": balance,
            ":id": transaction.id,
        })?;
    }

    tracing::debug!(
        "recomputed balances for {} transactions in account {account}",
        transactions.len()
    );

    Ok(())
}
