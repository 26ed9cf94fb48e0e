//! Endpoints for the distinct account and item name lookups used by the
//! entry form's autocomplete.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    transaction::core::{distinct_accounts, distinct_items},
};

/// The state needed for the lookup endpoints.
#[derive(Debug, Clone)]
pub struct LookupState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LookupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler returning the distinct account names, sorted.
pub async fn get_accounts_endpoint(
    State(state): State<LookupState>,
) -> Result<Json<Vec<String>>, Error> {
    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let accounts = distinct_accounts(&connection)?;

    Ok(Json(accounts))
}

/// The query parameters for the item lookup.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    /// Restrict to items used by one account.
    #[serde(default)]
    pub account: Option<String>,
}

/// A route handler returning the distinct item descriptions, sorted,
/// optionally scoped to one account.
pub async fn get_items_endpoint(
    State(state): State<LookupState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<Vec<String>>, Error> {
    let account = query
        .account
        .as_deref()
        .map(str::trim)
        .filter(|account| !account.is_empty());

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let items = distinct_items(account, &connection)?;

    Ok(Json(items))
}
