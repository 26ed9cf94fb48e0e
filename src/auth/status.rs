//! Defines the endpoint reporting whether the client is logged in.

use axum::{Json, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;
use time::format_description::well_known::Rfc3339;

use crate::auth::cookie::get_session_from_cookies;

/// A route handler reporting the client's session state.
///
/// Always returns 200 so the frontend can poll it without triggering the
/// unauthenticated redirect.
pub async fn auth_status_endpoint(jar: PrivateCookieJar) -> impl IntoResponse {
    match get_session_from_cookies(&jar) {
        Some(session) => {
            let expires_at = session
                .expires_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| session.expires_at.to_string());

            Json(json!({
                "authenticated": true,
                "username": session.username,
                "expires_at": expires_at,
            }))
        }
        None => Json(json!({ "authenticated": false })),
    }
}

#[cfg(test)]
mod status_tests {
    use axum::{
        Router,
        routing::{get, post},
    };
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::app_state::create_cookie_key;

    use super::auth_status_endpoint;

    fn get_test_server() -> TestServer {
        let key: Key = create_cookie_key("the auth status test secret");
        let router = Router::new()
            .route("/api/auth_status", get(auth_status_endpoint))
            .route("/api/logout", post(crate::auth::log_out_endpoint))
            .with_state(key);

        let mut server = TestServer::new(router).expect("could not create test server");
        server.save_cookies();
        server
    }

    #[tokio::test]
    async fn status_is_unauthenticated_without_a_session() {
        let server = get_test_server();

        let response = server.get("/api/auth_status").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({"authenticated": false}));
    }
}
