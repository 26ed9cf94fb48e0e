//! Bulk import of transactions from uploaded CSV files.
//!
//! Uploads are decoded with an encoding fallback, validated row by row
//! against the same rules as the transaction form, and inserted in a single
//! SQL transaction followed by one balance recomputation per account.

mod import_endpoint;
mod parse;

pub use import_endpoint::import_csv_endpoint;
