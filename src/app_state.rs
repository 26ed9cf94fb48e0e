//! Implements a struct that holds the state of the server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::{Credentials, LoginAttemptTracker, DEFAULT_SESSION_DURATION},
    db::initialize,
};

/// The state of the server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which a session is valid after logging in.
    pub session_duration: Duration,

    /// The username and bcrypt password hash that may log in.
    pub credentials: Credentials,

    /// The per-client failed log-in counters.
    pub login_tracker: Arc<Mutex<LoginAttemptTracker>>,

    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// Where CSV backup files are written.
    pub backup_dir: PathBuf,

    /// Where the static frontend files live.
    pub static_dir: PathBuf,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the ledger table.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        credentials: Credentials,
        backup_dir: PathBuf,
        static_dir: PathBuf,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            session_duration: DEFAULT_SESSION_DURATION,
            credentials,
            login_tracker: Arc::new(Mutex::new(LoginAttemptTracker::default())),
            db_connection: Arc::new(Mutex::new(db_connection)),
            backup_dir,
            static_dir,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
