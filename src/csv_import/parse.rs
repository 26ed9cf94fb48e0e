//! Parsing and validation of uploaded transaction CSV files.
//!
//! Parsing is all-or-nothing: the first invalid row aborts with its 1-based
//! row number (the header is row 1, so the first data row is row 2) and no
//! partial result is ever used.

use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};

use crate::{
    Error,
    transaction::{EntryDate, TransactionKind},
};

/// The header columns every import file must have. Order does not matter;
/// an extra `balance` column is accepted but ignored.
pub const REQUIRED_HEADERS: [&str; 5] = ["account", "date", "item", "type", "amount"];

/// The decoders tried in order when reading an uploaded file.
const CANDIDATE_ENCODINGS: [&Encoding; 2] = [UTF_8, SHIFT_JIS];

/// One validated data row from an import file.
///
/// Mirrors [crate::transaction::NewTransaction]; any `balance` column in the
/// file is dropped here because stored balances are always recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// The fund pool the row belongs to.
    pub account: String,
    /// When the transaction happened.
    pub date: EntryDate,
    /// The item description.
    pub item: String,
    /// `income` or `expense`.
    pub kind: TransactionKind,
    /// The positive amount.
    pub amount: i64,
}

/// Decode the raw upload as text, trying each candidate encoding in order.
///
/// # Errors
/// Returns [Error::ImportFile] if no candidate decodes the bytes cleanly.
pub fn decode_csv_bytes(bytes: &[u8]) -> Result<String, Error> {
    for encoding in CANDIDATE_ENCODINGS {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            let text = text.strip_prefix('\u{feff}').unwrap_or(&text).to_owned();
            return Ok(text);
        }
    }

    Err(Error::ImportFile(
        "the file is not valid UTF-8 or Shift_JIS text".to_owned(),
    ))
}

/// Parse and validate the whole CSV text into rows ready for insertion.
///
/// # Errors
/// Returns [Error::ImportFile] for a missing/incomplete header or broken CSV
/// structure, and [Error::ImportRow] citing the first invalid data row.
pub fn parse_transactions_csv(text: &str) -> Result<Vec<ParsedRow>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::ImportFile(format!("could not read the header row: {error}")))?
        .clone();

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !headers.iter().any(|header| header == **required))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(Error::ImportFile(format!(
            "missing required headers: {}",
            missing.join(", ")
        )));
    }

    let column = |name: &str| headers.iter().position(|header| header == name);
    let account_column = column("account").unwrap_or_default();
    let date_column = column("date").unwrap_or_default();
    let item_column = column("item").unwrap_or_default();
    let kind_column = column("type").unwrap_or_default();
    let amount_column = column("amount").unwrap_or_default();

    let mut rows = Vec::new();

    // The header is row 1, so data rows are numbered from 2.
    for (index, record) in reader.records().enumerate() {
        let row_number = index + 2;
        let record = record.map_err(|error| Error::ImportRow {
            row: row_number,
            reason: format!("malformed CSV record: {error}"),
        })?;

        let field = |column: usize, name: &str| -> Result<&str, Error> {
            match record.get(column) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(Error::ImportRow {
                    row: row_number,
                    reason: format!("{name} is empty"),
                }),
            }
        };

        let account = field(account_column, "account")?.to_owned();
        let item = field(item_column, "item")?.to_owned();

        let kind = TransactionKind::parse(field(kind_column, "type")?).map_err(|error| {
            Error::ImportRow {
                row: row_number,
                reason: error.to_string(),
            }
        })?;

        let date: EntryDate = field(date_column, "date")?.parse().map_err(|_| {
            Error::ImportRow {
                row: row_number,
                reason: "date must be in YYYY-MM-DD or YYYY-MM-DD HH:MM:SS format".to_owned(),
            }
        })?;

        let amount_text = field(amount_column, "amount")?;
        let amount: i64 = amount_text.parse().map_err(|_| Error::ImportRow {
            row: row_number,
            reason: format!("amount must be a whole number (got {amount_text:?})"),
        })?;
        if amount <= 0 {
            return Err(Error::ImportRow {
                row: row_number,
                reason: format!("amount must be a positive number (got {amount_text:?})"),
            });
        }

        rows.push(ParsedRow {
            account,
            date,
            item,
            kind,
            amount,
        });
    }

    Ok(rows)
}
