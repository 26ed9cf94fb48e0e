//! Defines the middleware that guards routes behind a valid session.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use serde_json::json;

use crate::{AppState, auth::cookie::get_session_from_cookies, endpoints};

/// The state needed to verify a session cookie.
#[derive(Clone)]
pub struct AuthState {
    /// The key for decrypting the session cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware that rejects requests without a valid, unexpired session.
///
/// API routes get a 401 JSON body the frontend recognises; page routes are
/// redirected to the log-in page.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("could not read the cookie jar: {:?}", error);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if get_session_from_cookies(&jar).is_some() {
        return next.run(Request::from_parts(parts, body)).await;
    }

    if parts.uri.path().starts_with("/api") {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "you must log in to use this endpoint",
                "login_required": true,
            })),
        )
            .into_response()
    } else {
        Redirect::to(endpoints::LOG_IN_VIEW).into_response()
    }
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::{app_state::create_cookie_key, auth::cookie::set_session_cookie};

    use super::{AuthState, auth_guard};

    fn get_test_state() -> AuthState {
        AuthState {
            cookie_key: create_cookie_key("the auth guard test secret"),
        }
    }

    async fn test_log_in(jar: axum_extra::extract::PrivateCookieJar) -> impl axum::response::IntoResponse {
        set_session_cookie(jar, "keeper", time::Duration::hours(2)).unwrap()
    }

    fn get_test_server(state: AuthState) -> TestServer {
        let router = Router::new()
            .route("/", get(|| async { "the app shell" }))
            .route("/api/transactions", get(|| async { "[]" }))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route("/test/log_in", get(test_log_in))
            .with_state(state);

        let mut server = TestServer::new(router).expect("could not create test server");
        server.save_cookies();
        server
    }

    #[tokio::test]
    async fn api_request_without_a_session_gets_401_json() {
        let server = get_test_server(get_test_state());

        let response = server.get("/api/transactions").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["login_required"], true);
    }

    #[tokio::test]
    async fn page_request_without_a_session_redirects_to_log_in() {
        let server = get_test_server(get_test_state());

        let response = server.get("/").await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/login");
    }

    #[tokio::test]
    async fn valid_session_passes_through() {
        let server = get_test_server(get_test_state());
        server.get("/test/log_in").await.assert_status_ok();

        let response = server.get("/api/transactions").await;

        response.assert_status_ok();
    }
}
