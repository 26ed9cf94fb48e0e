//! The API endpoint URIs.

/// The main ledger page, served from the static directory.
pub const ROOT: &str = "/";
/// The log-in page, served from the static directory.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for static files (scripts, styles).
pub const STATIC: &str = "/static";

/// The route for logging in.
pub const LOG_IN_API: &str = "/api/login";
/// The route for logging out the current session.
pub const LOG_OUT_API: &str = "/api/logout";
/// The route for checking whether the client is logged in.
pub const AUTH_STATUS: &str = "/api/auth_status";

/// The route for listing and creating transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for editing or deleting a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for listing the distinct account names.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route for listing the distinct item descriptions.
pub const ITEMS: &str = "/api/items";
/// The route for the per-account balance-over-time series.
pub const BALANCE_HISTORY: &str = "/api/balance_history";
/// The route for downloading a CSV backup of the ledger.
pub const BACKUP_CSV: &str = "/api/backup_csv";
/// The route for importing transactions from a CSV file.
pub const IMPORT_CSV: &str = "/api/import_csv";
