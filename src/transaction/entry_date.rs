//! A transaction timestamp that remembers whether a time of day was given.
//!
//! Entries recorded with only a date are stored at midnight. On the way back
//! out, a midnight time renders as `YYYY-MM-DD` while anything else renders
//! as `YYYY-MM-DD HH:MM:SS`, so date-only entries round-trip without growing
//! a spurious time component.

use std::{fmt, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::{
    Date, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const ENTRY_TIME_FORMAT: &[BorrowedFormatItem] = format_description!("[hour]:[minute]");

/// When a transaction happened.
///
/// Always stored with second precision; a time of exactly midnight marks the
/// entry as date-only. The stored text form `YYYY-MM-DD HH:MM:SS` sorts
/// lexicographically in chronological order, which the balance recomputation
/// pass relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryDate(PrimitiveDateTime);

impl EntryDate {
    /// Create an entry date from a date string and an optional `HH:MM` time
    /// string, as submitted by the interactive entry form.
    ///
    /// # Errors
    /// Returns [Error::Validation] if either part is malformed.
    pub fn from_parts(date: &str, time: Option<&str>) -> Result<Self, Error> {
        let date = Date::parse(date.trim(), DATE_FORMAT)
            .map_err(|_| Error::Validation("date must be in YYYY-MM-DD format".to_owned()))?;

        let time = match time.map(str::trim) {
            Some(time) if !time.is_empty() => Time::parse(time, ENTRY_TIME_FORMAT)
                .map_err(|_| Error::Validation("time must be in HH:MM format".to_owned()))?,
            _ => Time::MIDNIGHT,
        };

        Ok(Self(PrimitiveDateTime::new(date, time)))
    }

    /// Whether this entry was recorded without a time of day.
    pub fn is_date_only(&self) -> bool {
        self.0.time() == Time::MIDNIGHT
    }

    /// The calendar date, ignoring any time of day.
    pub fn date(&self) -> Date {
        self.0.date()
    }

    /// The calendar date rendered as `YYYY-MM-DD`.
    ///
    /// Used for grouping entries by day in the balance history.
    pub fn date_string(&self) -> String {
        self.0
            .date()
            .format(DATE_FORMAT)
            .unwrap_or_else(|_| self.0.date().to_string())
    }

    fn storage_string(&self) -> String {
        self.0
            .format(DATE_TIME_FORMAT)
            .unwrap_or_else(|_| self.0.to_string())
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_date_only() {
            write!(f, "{}", self.date_string())
        } else {
            write!(f, "{}", self.storage_string())
        }
    }
}

impl FromStr for EntryDate {
    type Err = Error;

    /// Parse either `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`, the two forms
    /// used in storage and CSV files.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();

        if let Ok(date_time) = PrimitiveDateTime::parse(text, DATE_TIME_FORMAT) {
            return Ok(Self(date_time));
        }

        Date::parse(text, DATE_FORMAT)
            .map(|date| Self(PrimitiveDateTime::new(date, Time::MIDNIGHT)))
            .map_err(|_| {
                Error::Validation(
                    "date must be in YYYY-MM-DD or YYYY-MM-DD HH:MM:SS format".to_owned(),
                )
            })
    }
}

impl ToSql for EntryDate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.storage_string()))
    }
}

impl FromSql for EntryDate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|error| FromSqlError::Other(Box::new(ParseEntryDateError(error))))
    }
}

#[derive(Debug)]
struct ParseEntryDateError(Error);

impl fmt::Display for ParseEntryDateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseEntryDateError {}

impl Serialize for EntryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;

        text.parse().map_err(|error: Error| {
            de::Error::custom(format!("invalid entry date {text:?}: {error}"))
        })
    }
}

#[cfg(test)]
mod entry_date_tests {
    use super::EntryDate;

    #[test]
    fn date_only_round_trips_without_a_time() {
        let date: EntryDate = "2025-06-10".parse().unwrap();

        assert!(date.is_date_only());
        assert_eq!(date.to_string(), "2025-06-10");
    }

    #[test]
    fn date_time_round_trips_with_seconds() {
        let date: EntryDate = "2025-06-10 19:47:03".parse().unwrap();

        assert!(!date.is_date_only());
        assert_eq!(date.to_string(), "2025-06-10 19:47:03");
    }

    #[test]
    fn interactive_entry_accepts_minute_precision() {
        let date = EntryDate::from_parts("2025-06-10", Some("19:47")).unwrap();

        assert_eq!(date.to_string(), "2025-06-10 19:47:00");
    }

    #[test]
    fn blank_time_is_treated_as_midnight() {
        let date = EntryDate::from_parts("2025-06-10", Some("  ")).unwrap();

        assert!(date.is_date_only());
    }

    #[test]
    fn malformed_date_is_rejected() {
        assert!(EntryDate::from_parts("10/06/2025", None).is_err());
        assert!("2025-13-40".parse::<EntryDate>().is_err());
    }

    #[test]
    fn dates_order_chronologically() {
        let earlier: EntryDate = "2025-06-09".parse().unwrap();
        let later: EntryDate = "2025-06-10 00:00:01".parse().unwrap();
        let midnight: EntryDate = "2025-06-10".parse().unwrap();

        assert!(earlier < midnight);
        assert!(midnight < later);
    }
}
