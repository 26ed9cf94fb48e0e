//! Defines the core data model and database queries for ledger entries.
//!
//! No business rules live here: field validation happens in the endpoints
//! before anything reaches these functions, and the `balance` column is only
//! ever written by the recomputation pass in [crate::transaction::balance].

use rusqlite::{
    Connection, Row, ToSql, named_params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, transaction::EntryDate};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction adds money to its account or removes it.
///
/// The sign of a transaction lives here; `amount` itself is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into the account (credit).
    Income,
    /// Money leaving the account (debit).
    Expense,
}

impl TransactionKind {
    /// The wire/storage string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Parse the wire/storage string, case-insensitively.
    ///
    /// # Errors
    /// Returns [Error::Validation] for anything other than `income` or
    /// `expense`.
    pub fn parse(text: &str) -> Result<Self, Error> {
        match text.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(Error::Validation(
                "type must be \"income\" or \"expense\"".to_owned(),
            )),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid transaction kind {other:?}").into(),
            )),
        }
    }
}

/// A single ledger entry: money earned into or spent from an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction. Assigned on insert, never reused.
    pub id: i64,
    /// The fund pool this transaction belongs to.
    pub account: String,
    /// When the transaction happened.
    pub date: EntryDate,
    /// A text description of what the transaction was for.
    pub item: String,
    /// Whether this is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The positive minor-unit magnitude of the movement.
    pub amount: i64,
    /// The account's running total immediately after this transaction, in
    /// `(date, id)` order. Derived data, maintained by recomputation.
    pub balance: i64,
}

/// The fields needed to insert or overwrite a ledger entry.
///
/// `balance` is deliberately absent: new rows are inserted with a
/// placeholder of zero and the recomputation pass fills in the real value.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The fund pool the transaction belongs to.
    pub account: String,
    /// When the transaction happened.
    pub date: EntryDate,
    /// A text description of what the transaction was for.
    pub item: String,
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// The positive minor-unit magnitude of the movement.
    pub amount: i64,
}

/// A filter for listing transactions.
///
/// Results are unordered; callers needing chronological order use
/// [transactions_for_account_ordered] or [all_transactions_ordered].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Restrict to one account, matched exactly.
    pub account: Option<String>,
    /// Restrict to items containing this substring.
    pub search: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the ledger entry table and its ordering index.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_ledger_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account TEXT NOT NULL,
                date TEXT NOT NULL,
                item TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount INTEGER NOT NULL,
                balance INTEGER NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('ledger_entry', 0)",
        (),
    )?;

    // Composite index matching the (account, date, id) recomputation scan.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_account_date
             ON ledger_entry(account, date, id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
pub fn map_ledger_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account: row.get(1)?,
        date: row.get(2)?,
        item: row.get(3)?,
        kind: row.get(4)?,
        amount: row.get(5)?,
        balance: row.get(6)?,
    })
}

/// Insert a new transaction with a placeholder balance of zero.
///
/// The caller is responsible for running the balance recomputation pass for
/// the affected account afterwards, within the same SQL transaction.
///
/// # Errors
/// Returns an [Error::SqlError] if the insert fails.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO ledger_entry (account, date, item, kind, amount, balance)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)
             RETURNING id, account, date, item, kind, amount, balance",
        )?
        .query_row(
            (
                &new_transaction.account,
                &new_transaction.date,
                &new_transaction.item,
                &new_transaction.kind,
                new_transaction.amount,
            ),
            map_ledger_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a stored transaction.
pub fn get_transaction(id: i64, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, account, date, item, kind, amount, balance
             FROM ledger_entry WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_ledger_row)?;

    Ok(transaction)
}

/// Overwrite every user-editable field of the transaction `id`.
///
/// The stored balance is left untouched; the caller must recompute balances
/// for both the old and new account afterwards.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a stored transaction.
pub fn update_transaction(
    id: i64,
    fields: NewTransaction,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE ledger_entry
         SET account = :account, date = :date, item = :item, kind = :kind, amount = :amount
         WHERE id = :id",
        named_params! {
            ":account": fields.account,
            ":date": fields.date,
            ":item": fields.item,
            ":kind": fields.kind,
            ":amount": fields.amount,
            ":id": id,
        },
    )?;

    match rows_updated {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Delete the transaction `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a stored transaction.
pub fn delete_transaction(id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM ledger_entry WHERE id = :id", &[(":id", &id)])?;

    match rows_deleted {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Delete every transaction in the store. Used by replace-mode imports.
///
/// Returns the number of rows deleted.
///
/// # Errors
/// Returns an [Error::SqlError] if the delete fails.
pub fn delete_all_transactions(connection: &Connection) -> Result<usize, Error> {
    let rows_deleted = connection.execute("DELETE FROM ledger_entry", ())?;

    Ok(rows_deleted)
}

/// List transactions matching `filter`, in no particular order.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn query_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let search_pattern = filter
        .search
        .as_deref()
        .map(|search| format!("%{}%", search));

    connection
        .prepare(
            "SELECT id, account, date, item, kind, amount, balance
             FROM ledger_entry
             WHERE (:account IS NULL OR account = :account)
               AND (:search IS NULL OR item LIKE :search)",
        )?
        .query_map(
            named_params! {
                ":account": filter.account,
                ":search": search_pattern,
            },
            map_ledger_row,
        )?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// All transactions for one account in `(date, id)` ascending order, the
/// canonical order used to derive running balances.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn transactions_for_account_ordered(
    account: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, account, date, item, kind, amount, balance
             FROM ledger_entry
             WHERE account = :account
             ORDER BY date ASC, id ASC",
        )?
        .query_map(&[(":account", &account)], map_ledger_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Every transaction in the store in `(date, id)` ascending order.
///
/// Used by the CSV backup and the balance history series.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn all_transactions_ordered(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, account, date, item, kind, amount, balance
             FROM ledger_entry
             ORDER BY date ASC, id ASC",
        )?
        .query_map([], map_ledger_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// The distinct account names in the store, sorted alphabetically.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn distinct_accounts(connection: &Connection) -> Result<Vec<String>, Error> {
    connection
        .prepare("SELECT DISTINCT account FROM ledger_entry ORDER BY account ASC")?
        .query_map([], |row| row.get(0))?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// The distinct item descriptions, sorted alphabetically, optionally scoped
/// to one account.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn distinct_items(
    account: Option<&str>,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT item FROM ledger_entry
             WHERE (:account IS NULL OR account = :account)
             ORDER BY item ASC",
        )?
        .query_map(named_params! { ":account": account }, |row| row.get(0))?
        .map(|row| row.map_err(Error::from))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
