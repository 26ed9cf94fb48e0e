//! Ledger transactions: the data model, the running-balance recomputation
//! pass, and the JSON endpoints that mutate and query them.

pub mod balance;
pub mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod entry_date;
mod form;
mod list_endpoint;
mod lookup_endpoints;

pub use balance::recompute_account_balances;
pub use core::{NewTransaction, Transaction, TransactionFilter, TransactionKind};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use entry_date::EntryDate;
pub use form::TransactionForm;
pub use list_endpoint::get_transactions_endpoint;
pub use lookup_endpoints::{get_accounts_endpoint, get_items_endpoint};
