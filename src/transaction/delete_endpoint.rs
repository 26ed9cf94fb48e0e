//! Defines the endpoint for deleting a transaction.

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
        balance::recompute_account_balances,
        core::{delete_transaction, get_transaction},
    },
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction.
///
/// The row's account is captured before removal so the remaining entries
/// can be recomputed, all within one SQL transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<i64>,
) -> Result<Response, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let sql_transaction = connection.unchecked_transaction()?;

    let account = get_transaction(transaction_id, &sql_transaction)?.account;

    delete_transaction(transaction_id, &sql_transaction)?;
    recompute_account_balances(&account, &sql_transaction)?;

    sql_transaction.commit()?;

    tracing::info!("deleted transaction {transaction_id} from account {account}");

    Ok(Json(json!({ "message": "transaction deleted" })).into_response())
}
