//! Session authentication: log-in/log-out endpoints, the private-cookie
//! session, the route guard and the failed-attempt lockout.

mod cookie;
mod lockout;
mod log_in;
mod log_out;
mod middleware;
mod status;

pub(crate) use cookie::DEFAULT_SESSION_DURATION;
pub(crate) use lockout::LoginAttemptTracker;
pub use log_in::log_in_endpoint;
pub use log_out::log_out_endpoint;
pub use middleware::auth_guard;
pub use status::auth_status_endpoint;

/// The single username and bcrypt password hash that may log in.
///
/// This is a single-user application, so credentials come from the server's
/// environment rather than a users table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The username the client must supply.
    pub username: String,
    /// The bcrypt hash of the password the client must supply.
    pub password_hash: String,
}

impl Credentials {
    /// Whether `username` and `password` match the stored credentials.
    ///
    /// The bcrypt check always runs, even for a wrong username, so response
    /// timing does not reveal which field was wrong.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let password_matches = bcrypt::verify(password, &self.password_hash)
            .inspect_err(|error| tracing::error!("could not verify the password hash: {error}"))
            .unwrap_or(false);

        username == self.username && password_matches
    }
}
