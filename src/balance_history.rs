//! The balance-history series used by the frontend chart.
//!
//! For each account the series holds the balance at the end of each day in
//! the union of all transaction dates, forward-filling days the account had
//! no activity and starting from zero before its first entry.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{AppState, Error, transaction::Transaction, transaction::core::all_transactions_ordered};

/// The state needed to build the balance history.
#[derive(Debug, Clone)]
pub struct BalanceHistoryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BalanceHistoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The per-day balance series for every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceHistory {
    /// The account names, sorted.
    pub accounts: Vec<String>,
    /// The union of all transaction dates, as `YYYY-MM-DD`, ascending.
    pub dates: Vec<String>,
    /// For each account, the balance at the end of each day in `dates`.
    pub balances: BTreeMap<String, Vec<i64>>,
}

/// Build the balance history from transactions already ordered by
/// `(date, id)` ascending.
///
/// Each entry overwrites its account's balance for that day, so after the
/// scan each day holds the last balance of the day.
pub fn build_balance_history(transactions: &[Transaction]) -> BalanceHistory {
    let mut day_balances: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
    let mut dates: Vec<String> = Vec::new();

    for transaction in transactions {
        let day = transaction.date.date_string();

        day_balances
            .entry(transaction.account.clone())
            .or_default()
            .insert(day.clone(), transaction.balance);

        if !dates.contains(&day) {
            dates.push(day);
        }
    }

    dates.sort();

    let mut balances = BTreeMap::new();
    for (account, days) in &day_balances {
        let mut series = Vec::with_capacity(dates.len());
        let mut last_balance = 0;

        for date in &dates {
            if let Some(balance) = days.get(date) {
                last_balance = *balance;
            }
            series.push(last_balance);
        }

        balances.insert(account.clone(), series);
    }

    BalanceHistory {
        accounts: day_balances.into_keys().collect(),
        dates,
        balances,
    }
}

/// A route handler returning each account's per-day balance series.
pub async fn get_balance_history_endpoint(
    State(state): State<BalanceHistoryState>,
) -> Result<Json<BalanceHistory>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let transactions = all_transactions_ordered(&connection)?;

    Ok(Json(build_balance_history(&transactions)))
}
