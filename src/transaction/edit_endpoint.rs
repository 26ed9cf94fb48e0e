//! Defines the endpoint for editing an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    transaction::{
        TransactionForm,
        balance::recompute_account_balances,
        core::{get_transaction, update_transaction},
    },
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for editing a transaction.
///
/// An edit may move the transaction to a different account, in which case
/// both the old and the new account get a recomputation pass; otherwise one
/// pass suffices. Everything runs in one SQL transaction, so a failed
/// recomputation rolls the field changes back too.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<i64>,
    Json(form): Json<TransactionForm>,
) -> Result<Response, Error> {
    let fields = form.validate()?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let sql_transaction = connection.unchecked_transaction()?;

    let old_account = get_transaction(transaction_id, &sql_transaction)?.account;
    let new_account = fields.account.clone();

    update_transaction(transaction_id, fields, &sql_transaction)?;

    recompute_account_balances(&old_account, &sql_transaction)?;
    if new_account != old_account {
        recompute_account_balances(&new_account, &sql_transaction)?;
    }

    let updated = get_transaction(transaction_id, &sql_transaction)?;

    sql_transaction.commit()?;

    tracing::info!(
        "updated transaction {transaction_id} ({old_account} -> {})",
        updated.account
    );

    Ok(Json(json!({
        "message": "transaction updated",
        "transaction": updated,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::Path, extract::State};
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        transaction::{
            NewTransaction, TransactionForm, TransactionKind,
            balance::recompute_account_balances,
            core::{create_transaction, transactions_for_account_ordered},
            form::AmountField,
        },
    };

    use super::{EditTransactionState, edit_transaction_endpoint};

    fn get_test_state() -> EditTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        EditTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn seed(state: &EditTransactionState, account: &str, date: &str, kind: TransactionKind, amount: i64) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        let id = create_transaction(
            NewTransaction {
                account: account.to_owned(),
                date: date.parse().unwrap(),
                item: "seed".to_owned(),
                kind,
                amount,
            },
            &connection,
        )
        .unwrap()
        .id;
        recompute_account_balances(account, &connection).unwrap();
        id
    }

    fn form(account: &str, date: &str, kind: &str, amount: i64) -> TransactionForm {
        TransactionForm {
            account: account.to_owned(),
            date: date.to_owned(),
            time: None,
            item: "edited".to_owned(),
            kind: kind.to_owned(),
            amount: AmountField::Number(amount),
        }
    }

    fn balances(state: &EditTransactionState, account: &str) -> Vec<i64> {
        let connection = state.db_connection.lock().unwrap();
        transactions_for_account_ordered(account, &connection)
            .unwrap()
            .iter()
            .map(|entry| entry.balance)
            .collect()
    }

    #[tokio::test]
    async fn edit_recomputes_the_account() {
        let state = get_test_state();
        let id = seed(&state, "Main", "2025-06-10", TransactionKind::Income, 300_000);
        seed(&state, "Main", "2025-06-11", TransactionKind::Expense, 50_000);

        edit_transaction_endpoint(
            State(state.clone()),
            Path(id),
            Json(form("Main", "2025-06-10", "income", 100_000)),
        )
        .await
        .unwrap();

        assert_eq!(balances(&state, "Main"), [100_000, 50_000]);
    }

    #[tokio::test]
    async fn moving_account_recomputes_both_sequences() {
        let state = get_test_state();
        seed(&state, "Main", "2025-06-01", TransactionKind::Income, 1_000);
        let moved = seed(&state, "Main", "2025-06-02", TransactionKind::Expense, 400);
        seed(&state, "Reserve", "2025-06-01", TransactionKind::Income, 50);

        edit_transaction_endpoint(
            State(state.clone()),
            Path(moved),
            Json(form("Reserve", "2025-06-02", "expense", 400)),
        )
        .await
        .unwrap();

        assert_eq!(balances(&state, "Main"), [1_000]);
        assert_eq!(balances(&state, "Reserve"), [50, -350]);
    }

    #[tokio::test]
    async fn missing_transaction_returns_not_found() {
        let state = get_test_state();

        let result = edit_transaction_endpoint(
            State(state),
            Path(42),
            Json(form("Main", "2025-06-10", "income", 1)),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn invalid_form_leaves_the_row_untouched() {
        let state = get_test_state();
        let id = seed(&state, "Main", "2025-06-10", TransactionKind::Income, 300_000);

        let result = edit_transaction_endpoint(
            State(state.clone()),
            Path(id),
            Json(form("Main", "not-a-date", "income", 1)),
        )
        .await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(balances(&state, "Main"), [300_000]);
    }
}
