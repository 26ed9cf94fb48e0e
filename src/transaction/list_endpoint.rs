//! Defines the endpoint for listing transactions with optional filters.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    transaction::{
        Transaction, TransactionFilter, core::query_transactions,
    },
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Restrict to items containing this substring.
    #[serde(default)]
    pub search: Option<String>,
    /// Restrict to one account, matched exactly.
    #[serde(default)]
    pub account: Option<String>,
}

/// A route handler returning the transactions matching the query.
pub async fn get_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let filter = TransactionFilter {
        account: non_blank(query.account),
        search: non_blank(query.search),
    };

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let transactions = query_transactions(&filter, &connection)?;

    tracing::debug!("listed {} transactions for {filter:?}", transactions.len());

    Ok(Json(transactions))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        transaction::{NewTransaction, TransactionKind, core::create_transaction},
    };

    use super::{ListTransactionsQuery, ListTransactionsState, get_transactions_endpoint};

    fn get_test_state() -> ListTransactionsState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = ListTransactionsState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        {
            let connection = state.db_connection.lock().unwrap();
            for (account, item) in [
                ("Main", "Groceries"),
                ("Main", "Rent"),
                ("Card", "Groceries online"),
            ] {
                create_transaction(
                    NewTransaction {
                        account: account.to_owned(),
                        date: "2025-06-10".parse().unwrap(),
                        item: item.to_owned(),
                        kind: TransactionKind::Expense,
                        amount: 1_000,
                    },
                    &connection,
                )
                .unwrap();
            }
        }

        state
    }

    #[tokio::test]
    async fn no_filters_returns_everything() {
        let state = get_test_state();

        let response =
            get_transactions_endpoint(State(state), Query(ListTransactionsQuery::default()))
                .await
                .unwrap();

        assert_eq!(response.0.len(), 3);
    }

    #[tokio::test]
    async fn search_and_account_filters_combine() {
        let state = get_test_state();

        let response = get_transactions_endpoint(
            State(state),
            Query(ListTransactionsQuery {
                search: Some("Groceries".to_owned()),
                account: Some("Card".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.len(), 1);
        assert_eq!(response.0[0].item, "Groceries online");
    }

    #[tokio::test]
    async fn blank_filters_are_ignored() {
        let state = get_test_state();

        let response = get_transactions_endpoint(
            State(state),
            Query(ListTransactionsQuery {
                search: Some("   ".to_owned()),
                account: Some(String::new()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.len(), 3);
    }
}
