//! Defines the app's routes and which of them sit behind the session guard.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::{
    AppState,
    auth::{auth_guard, auth_status_endpoint, log_in_endpoint, log_out_endpoint},
    backup::backup_csv_endpoint,
    balance_history::get_balance_history_endpoint,
    csv_import::import_csv_endpoint,
    endpoints,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_accounts_endpoint, get_items_endpoint, get_transactions_endpoint,
    },
};

/// Build the application router.
///
/// Everything except the log-in page, the log-in and log-out endpoints, the
/// auth-status probe and the static assets requires a valid session.
pub fn build_router(state: AppState) -> Router {
    let index_page = ServeFile::new(state.static_dir.join("index.html"));
    let log_in_page = ServeFile::new(state.static_dir.join("login.html"));
    let static_files = ServeDir::new(&state.static_dir);

    let protected_routes = Router::new()
        .route_service(endpoints::ROOT, index_page)
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::ACCOUNTS, get(get_accounts_endpoint))
        .route(endpoints::ITEMS, get(get_items_endpoint))
        .route(endpoints::BALANCE_HISTORY, get(get_balance_history_endpoint))
        .route(endpoints::BACKUP_CSV, get(backup_csv_endpoint))
        .route(endpoints::IMPORT_CSV, post(import_csv_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let unprotected_routes = Router::new()
        .route_service(endpoints::LOG_IN_VIEW, log_in_page)
        .route(endpoints::LOG_IN_API, post(log_in_endpoint))
        .route(endpoints::LOG_OUT_API, post(log_out_endpoint))
        .route(endpoints::AUTH_STATUS, get(auth_status_endpoint))
        .nest_service(endpoints::STATIC, static_files);

    protected_routes.merge(unprotected_routes).with_state(state)
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, auth::Credentials};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "the routing test secret",
            Credentials {
                username: "keeper".to_owned(),
                password_hash: bcrypt::hash("hunter2", 4).unwrap(),
            },
            std::env::temp_dir().join("ledger_routing_test_backups"),
            std::env::temp_dir(),
        )
        .unwrap();

        let mut server = TestServer::new(build_router(state)).expect("could not create test server");
        server.save_cookies();
        server
    }

    #[tokio::test]
    async fn api_routes_require_a_session() {
        let server = get_test_server();

        let response = server.get("/api/transactions").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["login_required"], true);
    }

    #[tokio::test]
    async fn logging_in_unlocks_the_api() {
        let server = get_test_server();

        server
            .post("/api/login")
            .json(&json!({"username": "keeper", "password": "hunter2"}))
            .await
            .assert_status_ok();

        let response = server.get("/api/transactions").await;

        response.assert_status_ok();
        let transactions: Value = response.json();
        assert_eq!(transactions, json!([]));
    }

    #[tokio::test]
    async fn logging_out_locks_the_api_again() {
        let server = get_test_server();
        server
            .post("/api/login")
            .json(&json!({"username": "keeper", "password": "hunter2"}))
            .await
            .assert_status_ok();

        server.post("/api/logout").await.assert_status_ok();

        let response = server.get("/api/transactions").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_status_is_reachable_without_a_session() {
        let server = get_test_server();

        let response = server.get("/api/auth_status").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["authenticated"], false);
    }

    #[tokio::test]
    async fn transactions_round_trip_through_the_api() {
        let server = get_test_server();
        server
            .post("/api/login")
            .json(&json!({"username": "keeper", "password": "hunter2"}))
            .await
            .assert_status_ok();

        server
            .post("/api/transactions")
            .json(&json!({
                "account": "Main",
                "date": "2025-06-10",
                "item": "Salary",
                "type": "income",
                "amount": 300000,
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/transactions").await;
        let transactions: Value = response.json();
        assert_eq!(transactions[0]["balance"], 300000);

        server
            .delete("/api/transactions/1")
            .await
            .assert_status_ok();
        let response = server.get("/api/transactions").await;
        let transactions: Value = response.json();
        assert_eq!(transactions, json!([]));
    }
}
