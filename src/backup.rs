//! CSV backups of the whole ledger.
//!
//! Each backup is written into the backup directory with a timestamped name
//! and also returned to the client as a download. Only the newest few files
//! are kept on disk.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{OffsetDateTime, macros::format_description};

use crate::{AppState, Error, transaction::Transaction, transaction::core::all_transactions_ordered};

/// The file-name prefix shared by every backup file.
const BACKUP_FILE_PREFIX: &str = "transactions_backup_";

/// How many backup files are kept on disk.
const MAX_BACKUP_FILES: usize = 3;

/// The state needed to write a ledger backup.
#[derive(Debug, Clone)]
pub struct BackupState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where backup files are written.
    pub backup_dir: PathBuf,
}

impl FromRef<AppState> for BackupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            backup_dir: state.backup_dir.clone(),
        }
    }
}

/// Render the transactions as CSV with the columns
/// `id,account,date,item,type,amount,balance`.
///
/// Dates follow the display rule: midnight entries are written date-only.
pub fn write_transactions_csv(transactions: &[Transaction]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["id", "account", "date", "item", "type", "amount", "balance"])
        .map_err(|error| Error::Storage(format!("could not write the CSV header: {error}")))?;

    for transaction in transactions {
        writer
            .write_record([
                transaction.id.to_string(),
                transaction.account.clone(),
                transaction.date.to_string(),
                transaction.item.clone(),
                transaction.kind.as_str().to_owned(),
                transaction.amount.to_string(),
                transaction.balance.to_string(),
            ])
            .map_err(|error| Error::Storage(format!("could not write a CSV row: {error}")))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::Storage(format!("could not flush the CSV: {error}")))
}

/// Pick a file name in `backup_dir` that does not exist yet.
///
/// The timestamp includes microseconds; if two backups still collide, a
/// counter is appended until the name is free.
pub fn generate_backup_filename(backup_dir: &Path, now: OffsetDateTime) -> PathBuf {
    let timestamp_format =
        format_description!("[year][month][day]_[hour][minute][second]_[subsecond digits:6]");
    let timestamp = now
        .format(&timestamp_format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());

    let base = format!("{BACKUP_FILE_PREFIX}{timestamp}");
    let mut path = backup_dir.join(format!("{base}.csv"));

    let mut counter = 1;
    while path.exists() {
        path = backup_dir.join(format!("{base}_{counter}.csv"));
        counter += 1;
    }

    path
}

/// Delete old backup files so at most `max_files` remain, newest first by
/// modification time.
pub fn cleanup_old_backups(backup_dir: &Path, max_files: usize) -> Result<(), Error> {
    let entries = fs::read_dir(backup_dir)
        .map_err(|error| Error::Storage(format!("could not list the backup directory: {error}")))?;

    let mut backups: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|error| Error::Storage(format!("could not list a backup file: {error}")))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if name.starts_with(BACKUP_FILE_PREFIX) && name.ends_with(".csv") {
            let modified = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            backups.push((entry.path(), modified));
        }
    }

    if backups.len() <= max_files {
        return Ok(());
    }

    backups.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in backups.drain(max_files..) {
        if let Err(error) = fs::remove_file(&path) {
            tracing::error!("could not delete old backup {}: {}", path.display(), error);
        } else {
            tracing::info!("deleted old backup {}", path.display());
        }
    }

    Ok(())
}

/// A route handler that writes a CSV backup of the whole ledger and returns
/// it as a download.
pub async fn backup_csv_endpoint(State(state): State<BackupState>) -> Result<Response, Error> {
    let transactions = {
        let connection = state.db_connection.lock().map_err(|_| Error::DatabaseLock)?;
        all_transactions_ordered(&connection)?
    };

    let csv_bytes = write_transactions_csv(&transactions)?;

    fs::create_dir_all(&state.backup_dir)
        .map_err(|error| Error::Storage(format!("could not create the backup directory: {error}")))?;

    // Keep one slot free for the file about to be written.
    cleanup_old_backups(&state.backup_dir, MAX_BACKUP_FILES - 1)?;

    let path = generate_backup_filename(&state.backup_dir, OffsetDateTime::now_utc());
    fs::write(&path, &csv_bytes)
        .map_err(|error| Error::Storage(format!("could not write the backup file: {error}")))?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transactions_backup.csv".to_owned());

    tracing::info!("wrote backup {} ({} rows)", path.display(), transactions.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv_bytes,
    )
        .into_response())
}

#[cfg(test)]
mod backup_tests {
    use std::{
        fs,
        sync::{Arc, Mutex},
    };

    use axum::extract::State;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        transaction::{
            NewTransaction, TransactionKind,
            core::create_transaction,
            recompute_account_balances,
        },
    };

    use super::{
        BackupState, backup_csv_endpoint, cleanup_old_backups, generate_backup_filename,
        write_transactions_csv,
    };

    fn populated_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        create_transaction(
            NewTransaction {
                account: "Main".to_owned(),
                date: "2025-06-10".parse().unwrap(),
                item: "Salary".to_owned(),
                kind: TransactionKind::Income,
                amount: 300_000,
            },
            &connection,
        )
        .unwrap();
        create_transaction(
            NewTransaction {
                account: "Main".to_owned(),
                date: "2025-06-11 19:47:03".parse().unwrap(),
                item: "Dinner".to_owned(),
                kind: TransactionKind::Expense,
                amount: 4_200,
            },
            &connection,
        )
        .unwrap();
        recompute_account_balances("Main", &connection).unwrap();

        connection
    }

    #[test]
    fn csv_has_the_expected_columns_and_date_rendering() {
        let connection = populated_connection();
        let transactions =
            crate::transaction::core::all_transactions_ordered(&connection).unwrap();

        let bytes = write_transactions_csv(&transactions).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "id,account,date,item,type,amount,balance");
        assert_eq!(lines[1], "1,Main,2025-06-10,Salary,income,300000,300000");
        assert_eq!(
            lines[2],
            "2,Main,2025-06-11 19:47:03,Dinner,expense,4200,295800"
        );
    }

    #[test]
    fn filename_has_the_backup_prefix_and_avoids_collisions() {
        let dir = std::env::temp_dir().join("ledger_backup_name_test");
        fs::create_dir_all(&dir).unwrap();
        let now = datetime!(2025-06-10 12:00:00 UTC);

        let first = generate_backup_filename(&dir, now);
        assert_eq!(
            first.file_name().unwrap().to_string_lossy(),
            "transactions_backup_20250610_120000_000000.csv"
        );

        fs::write(&first, b"taken").unwrap();
        let second = generate_backup_filename(&dir, now);
        assert_eq!(
            second.file_name().unwrap().to_string_lossy(),
            "transactions_backup_20250610_120000_000000_1.csv"
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cleanup_keeps_only_the_newest_files() {
        let dir = std::env::temp_dir().join("ledger_backup_cleanup_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        for index in 0..4 {
            let path = dir.join(format!("transactions_backup_{index}.csv"));
            fs::write(&path, b"old").unwrap();
            // Distinct mtimes so the sort order is deterministic.
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        fs::write(dir.join("unrelated.txt"), b"keep me").unwrap();

        cleanup_old_backups(&dir, 2).unwrap();

        let mut remaining: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            [
                "transactions_backup_2.csv",
                "transactions_backup_3.csv",
                "unrelated.txt"
            ]
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn backup_endpoint_writes_a_file_and_returns_the_csv() {
        let dir = std::env::temp_dir().join("ledger_backup_endpoint_test");
        let _ = fs::remove_dir_all(&dir);
        let state = BackupState {
            db_connection: Arc::new(Mutex::new(populated_connection())),
            backup_dir: dir.clone(),
        };

        let response = backup_csv_endpoint(State(state)).await.unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let disposition = response
            .headers()
            .get(axum::http::header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.starts_with("attachment; filename=\"transactions_backup_"));

        let written: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(written.len(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }
}
