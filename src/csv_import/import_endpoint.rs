//! Defines the endpoint for importing transactions from an uploaded CSV file.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Multipart, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    csv_import::parse::{ParsedRow, decode_csv_bytes, parse_transactions_csv},
    transaction::{
        NewTransaction, recompute_account_balances,
        core::{create_transaction, delete_all_transactions},
    },
};

/// The state needed to import transactions.
#[derive(Debug, Clone)]
pub struct ImportTransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Whether imported rows are added to the existing ledger or replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Keep existing rows and add the imported ones.
    #[default]
    Append,
    /// Delete every existing row first.
    Replace,
}

impl ImportMode {
    fn parse(text: &str) -> Result<Self, Error> {
        match text.trim().to_lowercase().as_str() {
            "" | "append" => Ok(ImportMode::Append),
            "replace" => Ok(ImportMode::Replace),
            _ => Err(Error::Validation(
                "mode must be \"append\" or \"replace\"".to_owned(),
            )),
        }
    }
}

/// What an import changed, for the response and the logs.
#[derive(Debug, PartialEq, Eq)]
pub struct ImportOutcome {
    /// How many rows were inserted.
    pub inserted: usize,
    /// The accounts whose balance columns were recomputed.
    pub recomputed_accounts: Vec<String>,
}

/// Insert parsed rows and recompute balances, once per distinct account.
///
/// The caller is expected to hold a SQL transaction open on `connection` so
/// the whole import commits or rolls back as one unit.
pub fn import_parsed_rows(
    rows: Vec<ParsedRow>,
    mode: ImportMode,
    connection: &Connection,
) -> Result<ImportOutcome, Error> {
    if mode == ImportMode::Replace {
        let deleted = delete_all_transactions(connection)?;
        tracing::info!("replace mode: deleted {} existing transactions", deleted);
    }

    let mut recomputed_accounts: Vec<String> = rows
        .iter()
        .map(|row| row.account.clone())
        .collect();
    recomputed_accounts.sort();
    recomputed_accounts.dedup();

    let mut inserted = 0;
    for row in rows {
        create_transaction(
            NewTransaction {
                account: row.account,
                date: row.date,
                item: row.item,
                kind: row.kind,
                amount: row.amount,
            },
            connection,
        )?;
        inserted += 1;
    }

    for account in &recomputed_accounts {
        recompute_account_balances(account, connection)?;
    }

    Ok(ImportOutcome {
        inserted,
        recomputed_accounts,
    })
}

/// A route handler for importing transactions from a multipart CSV upload.
///
/// Expects a `file` part holding the CSV bytes and an optional `mode` part
/// (`append` or `replace`, defaulting to append). The import is
/// all-or-nothing: the first invalid row aborts with its row number and no
/// rows are inserted.
pub async fn import_csv_endpoint(
    State(state): State<ImportTransactionsState>,
    mut multipart: Multipart,
) -> Result<Response, Error> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut mode = ImportMode::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::Validation(format!("could not read the upload: {error}")))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(|error| {
                    Error::Validation(format!("could not read the uploaded file: {error}"))
                })?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("mode") => {
                let text = field.text().await.map_err(|error| {
                    Error::Validation(format!("could not read the mode field: {error}"))
                })?;
                mode = ImportMode::parse(&text)?;
            }
            _ => {}
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| Error::Validation("no file was uploaded".to_owned()))?;

    let text = decode_csv_bytes(&file_bytes)?;
    let rows = parse_transactions_csv(&text)?;

    let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
    let sql_transaction = connection.unchecked_transaction()?;

    let outcome = import_parsed_rows(rows, mode, &sql_transaction)?;

    sql_transaction.commit()?;

    tracing::info!(
        "imported {} transactions across {} accounts ({:?} mode)",
        outcome.inserted,
        outcome.recomputed_accounts.len(),
        mode,
    );

    Ok(Json(json!({
        "message": "import complete",
        "imported_count": outcome.inserted,
    }))
    .into_response())
}
