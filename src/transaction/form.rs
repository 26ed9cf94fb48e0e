//! The JSON payload for creating or editing a transaction, and its
//! validation into a [NewTransaction].

use serde::Deserialize;

use crate::{
    Error,
    transaction::{EntryDate, NewTransaction, TransactionKind},
};

/// The client-submitted fields for a transaction.
///
/// Any externally supplied `balance` is rejected by omission: the field is
/// simply not part of the payload, because balances are derived, never
/// accepted from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// The fund pool the transaction belongs to.
    pub account: String,
    /// The transaction date as `YYYY-MM-DD`.
    pub date: String,
    /// An optional time of day as `HH:MM`.
    #[serde(default)]
    pub time: Option<String>,
    /// A text description of what the transaction was for.
    pub item: String,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The positive amount, as a JSON number or a numeric string.
    pub amount: AmountField,
}

/// An amount submitted either as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    /// A JSON number, e.g. `300000`.
    Number(i64),
    /// A numeric string, e.g. `"300000"`.
    Text(String),
}

impl TransactionForm {
    /// Validate every field and build the [NewTransaction] to store.
    ///
    /// # Errors
    /// Returns [Error::Validation] with a client-facing reason if a required
    /// field is blank, the kind is not `income`/`expense`, the amount is not
    /// a positive whole number, or the date/time is malformed.
    pub fn validate(&self) -> Result<NewTransaction, Error> {
        let account = required_field(&self.account, "account")?;
        let item = required_field(&self.item, "item")?;

        if self.kind.trim().is_empty() {
            return Err(Error::Validation("type is required".to_owned()));
        }
        let kind = TransactionKind::parse(&self.kind)?;

        if self.date.trim().is_empty() {
            return Err(Error::Validation("date is required".to_owned()));
        }
        let date = EntryDate::from_parts(&self.date, self.time.as_deref())?;

        let amount = self.parse_amount()?;

        Ok(NewTransaction {
            account,
            date,
            item,
            kind,
            amount,
        })
    }

    fn parse_amount(&self) -> Result<i64, Error> {
        let amount = match &self.amount {
            AmountField::Number(amount) => *amount,
            AmountField::Text(text) => text.trim().parse().map_err(|_| {
                Error::Validation("amount must be a whole number".to_owned())
            })?,
        };

        if amount <= 0 {
            return Err(Error::Validation(
                "amount must be a positive whole number".to_owned(),
            ));
        }

        Ok(amount)
    }
}

fn required_field(value: &str, name: &str) -> Result<String, Error> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{name} is required")));
    }

    Ok(trimmed.to_owned())
}
