//! Defines the log-out endpoint.

use axum::{Json, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::auth::cookie::invalidate_session_cookie;

/// A route handler for logging out.
///
/// Clears the session cookies. Always succeeds, even without a session.
pub async fn log_out_endpoint(jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = invalidate_session_cookie(jar);

    (
        jar,
        Json(json!({
            "success": true,
            "message": "logged out",
        })),
    )
}

#[cfg(test)]
mod log_out_tests {
    use axum::{Router, routing::post};
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::app_state::create_cookie_key;

    use super::log_out_endpoint;

    #[tokio::test]
    async fn log_out_succeeds_without_a_session() {
        let key: Key = create_cookie_key("the log out test secret");
        let router = Router::new()
            .route("/api/logout", post(log_out_endpoint))
            .with_state(key);
        let server = TestServer::new(router).expect("could not create test server");

        let response = server.post("/api/logout").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({"success": true, "message": "logged out"}));
    }
}
