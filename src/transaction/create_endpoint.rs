//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    transaction::{
        TransactionForm,
        balance::recompute_account_balances,
        core::{create_transaction, get_transaction},
    },
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
///
/// The row is inserted with a placeholder balance and the account's whole
/// balance column is recomputed in the same SQL transaction, so backdated
/// entries land in the right place immediately.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Json(form): Json<TransactionForm>,
) -> Result<Response, Error> {
    let new_transaction = form.validate()?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let sql_transaction = connection.unchecked_transaction()?;

    let created = create_transaction(new_transaction, &sql_transaction)?;
    recompute_account_balances(&created.account, &sql_transaction)?;
    // Re-read for the recomputed balance.
    let created = get_transaction(created.id, &sql_transaction)?;

    sql_transaction.commit()?;

    tracing::info!(
        "created transaction {} ({} {} {} on {})",
        created.id,
        created.account,
        created.kind.as_str(),
        created.amount,
        created.date,
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "transaction created",
            "transaction": created,
        })),
    )
        .into_response())
}
