//! Money Tracker is a self-hosted web app for keeping a household ledger.
//!
//! Income and expense entries are recorded against named accounts (fund
//! pools), and every entry stores the account's running balance at that
//! point in time. The balance column is derived data: any mutation to the
//! ledger triggers a full recomputation pass for the affected account(s).
//!
//! This library provides a JSON API plus a thin static-file frontend.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod backup;
mod balance_history;
mod csv_import;
mod db;
mod endpoints;
mod routing;
mod transaction;

pub use app_state::AppState;
pub use auth::Credentials;
pub use db::initialize as initialize_db;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A request failed validation before any state was mutated.
    ///
    /// The message is safe to show to the client.
    #[error("{0}")]
    Validation(String),

    /// The requested transaction does not exist.
    ///
    /// The client should check that the ID is correct and that the
    /// transaction has not already been deleted.
    #[error("the requested transaction could not be found")]
    NotFound,

    /// The uploaded CSV file could not be used at all: it did not decode as
    /// text, was not valid CSV, or was missing required header columns.
    ///
    /// The whole import is aborted with nothing inserted.
    #[error("could not read the CSV file: {0}")]
    ImportFile(String),

    /// A data row in the uploaded CSV failed validation.
    ///
    /// `row` is 1-based and counts the header as row 1, so the first data
    /// row is row 2. The whole import is aborted with nothing inserted.
    #[error("row {row}: {reason}")]
    ImportRow {
        /// The 1-based row number of the offending row (header is row 1).
        row: usize,
        /// Why the row was rejected.
        reason: String,
    },

    /// The username or password was wrong.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// Too many failed log-in attempts from the same client.
    #[error("too many failed log-in attempts, try again in {minutes} minutes")]
    LockedOut {
        /// How long the client must wait before another attempt is accepted.
        minutes: i64,
    },

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A file-system failure while writing a backup or reading an upload.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::ImportFile(_) | Error::ImportRow { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::LockedOut { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::DatabaseLock | Error::SqlError(_) | Error::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal errors are logged but never leaked to the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "an internal error occurred, check the server logs for details".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use crate::Error;

    #[test]
    fn validation_maps_to_bad_request() {
        let error = Error::Validation("amount must be a positive whole number".to_owned());

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn import_row_message_includes_row_number() {
        let error = Error::ImportRow {
            row: 4,
            reason: "amount must be a positive whole number".to_owned(),
        };

        assert_eq!(
            error.to_string(),
            "row 4: amount must be a positive whole number"
        );
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn lockout_maps_to_too_many_requests() {
        let error = Error::LockedOut { minutes: 30 };

        assert_eq!(error.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }
}
