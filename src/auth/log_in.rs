//! Defines the log-in endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use serde::Deserialize;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{
        Credentials, LoginAttemptTracker,
        cookie::set_session_cookie,
        lockout::LOCKOUT_DURATION,
    },
};

/// The key used for clients whose address cannot be determined.
const LOCAL_CLIENT_KEY: &str = "local";

/// The state needed to log a client in.
#[derive(Clone)]
pub struct LogInState {
    /// The key for signing and encrypting the session cookies.
    pub cookie_key: Key,
    /// How long a new session lasts.
    pub session_duration: Duration,
    /// The credentials the client must match.
    pub credentials: Credentials,
    /// The per-client failed-attempt counters.
    pub login_tracker: Arc<Mutex<LoginAttemptTracker>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            session_duration: state.session_duration,
            credentials: state.credentials.clone(),
            login_tracker: state.login_tracker.clone(),
        }
    }
}

impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form the client submits to log in.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    /// The username to log in as.
    pub username: String,
    /// The plain-text password.
    pub password: String,
}

/// The key the failed-attempt counter is filed under for this request.
///
/// Behind a reverse proxy the client address arrives in `X-Forwarded-For`;
/// the first value is the original client. Without the header every client
/// shares one local key, which is the direct-access single-user case.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| LOCAL_CLIENT_KEY.to_owned())
}

/// A route handler for logging in.
///
/// After too many failed attempts the client's key is locked out for the
/// lockout window and further attempts are rejected without checking the
/// password.
pub async fn log_in_endpoint(
    State(state): State<LogInState>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
    Json(form): Json<LogInForm>,
) -> Result<Response, Error> {
    let key = client_key(&headers);
    let now = OffsetDateTime::now_utc();

    {
        let mut tracker = state.login_tracker.lock().map_err(|_| Error::DatabaseLock)?;

        if tracker.is_locked(&key, now) {
            tracing::warn!("rejected log-in attempt from locked-out client {}", key);
            return Err(Error::LockedOut {
                minutes: LOCKOUT_DURATION.whole_minutes(),
            });
        }
    }

    if state.credentials.matches(&form.username, &form.password) {
        let mut tracker = state.login_tracker.lock().map_err(|_| Error::DatabaseLock)?;
        tracker.record_success(&key);
        drop(tracker);

        let jar = set_session_cookie(jar, &form.username, state.session_duration)
            .map_err(|error| Error::Storage(format!("could not format the session expiry: {error}")))?;

        tracing::info!("{} logged in", form.username);

        return Ok((
            jar,
            Json(json!({
                "success": true,
                "message": "logged in",
            })),
        )
            .into_response());
    }

    let mut tracker = state.login_tracker.lock().map_err(|_| Error::DatabaseLock)?;
    tracker.record_failure(&key, now);
    let remaining = tracker.remaining_attempts(&key);
    drop(tracker);

    tracing::warn!(
        "failed log-in attempt for {:?} from {} ({} attempts remaining)",
        form.username,
        key,
        remaining,
    );

    Ok((
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": Error::InvalidCredentials.to_string(),
            "remaining_attempts": remaining,
        })),
    )
        .into_response())
}
