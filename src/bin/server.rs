use std::{
    env,
    fs::OpenOptions,
    net::SocketAddr,
    path::PathBuf,
    process::exit,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use money_tracker::{AppState, Credentials, build_router, graceful_shutdown};

/// The web server for the money tracker ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, default_value = "money_tracker.db")]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 4000)]
    port: u16,

    /// Directory holding the frontend files (index.html, login.html).
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Directory where CSV backups are written.
    #[arg(long, default_value = "backups")]
    backup_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let credentials = Credentials {
        username: require_env("LOGIN_USERNAME"),
        password_hash: require_env("LOGIN_PASSWORD_HASH"),
    };
    let secret = require_env("SECRET");

    let connection = Connection::open(&args.db_path)
        .unwrap_or_else(|error| {
            tracing::error!("could not open the database at {}: {}", args.db_path, error);
            exit(1)
        });

    let state = AppState::new(
        connection,
        &secret,
        credentials,
        args.backup_dir,
        args.static_dir,
    )
    .unwrap_or_else(|error| {
        tracing::error!("could not initialize the application state: {}", error);
        exit(1)
    });

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

/// Read a required environment variable or exit with a hint to run the
/// set_password utility.
fn require_env(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        eprintln!(
            "The environment variable '{name}' must be set. \
            Run the set_password utility to generate a .env file, \
            then source it before starting the server."
        );
        exit(1)
    })
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("money_tracker.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // 5xx responses are already logged where they happen.
        .on_failure(());

    router.layer(tracing_layer)
}
