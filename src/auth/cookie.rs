//! Defines functions for handling the session with private cookies.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

pub(crate) const COOKIE_USERNAME: &str = "username";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";

/// How long a session lasts before the client must log in again.
pub(crate) const DEFAULT_SESSION_DURATION: Duration = Duration::hours(2);

/// A logged-in session recovered from the cookie jar.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Session {
    /// The username that logged in.
    pub username: String,
    /// When the session stops being valid.
    pub expires_at: OffsetDateTime,
}

/// Add the session cookies to the jar, indicating that `username` is logged
/// in until `duration` from now.
///
/// Returns the cookie jar with the cookies added.
///
/// # Errors
/// Returns a [time::error::Format] if the expiry time cannot be formatted.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    username: &str,
    duration: Duration,
) -> Result<PrivateCookieJar, time::error::Format> {
    let expiry = OffsetDateTime::now_utc() + duration;
    let expiry_string = expiry.format(&Rfc3339)?;

    Ok(jar
        .add(
            Cookie::build((COOKIE_USERNAME, username.to_owned()))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        )
        .add(
            Cookie::build((COOKIE_EXPIRY, expiry_string))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        ))
}

/// Set the session cookies to invalid values with a max age of zero, which
/// should delete them on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USERNAME, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
    .add(
        Cookie::build((COOKIE_EXPIRY, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Recover the session from the cookie jar.
///
/// Returns `None` when either cookie is missing, the expiry does not parse,
/// or the session has expired.
pub(crate) fn get_session_from_cookies(jar: &PrivateCookieJar) -> Option<Session> {
    let username = jar.get(COOKIE_USERNAME)?.value().to_owned();
    let expiry_text = jar.get(COOKIE_EXPIRY)?.value().to_owned();

    let expires_at = OffsetDateTime::parse(&expiry_text, &Rfc3339)
        .inspect_err(|error| tracing::warn!("could not parse session expiry cookie: {error}"))
        .ok()?;

    if expires_at <= OffsetDateTime::now_utc() {
        return None;
    }

    Some(Session {
        username,
        expires_at,
    })
}
