//! Database schema initialization.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, transaction::core::create_ledger_entry_table};

/// Create the application's tables if they do not exist.
///
/// # Errors
/// Returns an error if table creation fails.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_ledger_entry_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }
}
