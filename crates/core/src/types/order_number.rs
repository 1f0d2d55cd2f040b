//! Human-readable order numbers.
//!
//! Format: `GM` + `YYYYMMDD` + a 4-digit zero-padded sequence that
//! resets daily, e.g. `GM202608070042`. Numbers are unique per day;
//! the database enforces this with a unique index and callers retry on
//! conflict, so two concurrent checkouts can never commit the same
//! number.

use core::fmt;
use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The constant tag every Groenmarkt order number starts with.
pub const ORDER_NUMBER_TAG: &str = "GM";

const SEQUENCE_DIGITS: usize = 4;
const DATE_DIGITS: usize = 8;

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// Missing the `GM` tag.
    #[error("order number must start with {ORDER_NUMBER_TAG}")]
    MissingTag,
    /// The date segment is not a valid `YYYYMMDD` calendar date.
    #[error("order number has an invalid date segment")]
    InvalidDate,
    /// The sequence segment is not four digits.
    #[error("order number has an invalid sequence segment")]
    InvalidSequence,
}

/// A parsed order number: tag + calendar date + daily sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber {
    date: NaiveDate,
    sequence: u16,
}

impl OrderNumber {
    /// The first order number of a given day.
    #[must_use]
    pub const fn first_of_day(date: NaiveDate) -> Self {
        Self { date, sequence: 1 }
    }

    /// Construct from a date and an explicit sequence.
    #[must_use]
    pub const fn new(date: NaiveDate, sequence: u16) -> Self {
        Self { date, sequence }
    }

    /// The next number after `highest_existing` for `date`, or the first
    /// of the day when no order exists yet.
    #[must_use]
    pub fn next(date: NaiveDate, highest_existing: Option<&Self>) -> Self {
        match highest_existing {
            Some(n) if n.date == date => Self {
                date,
                sequence: n.sequence + 1,
            },
            _ => Self::first_of_day(date),
        }
    }

    /// The calendar day this number belongs to.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The 1-based position within the day.
    #[must_use]
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }

    /// The `GMYYYYMMDD` prefix shared by all numbers of one day.
    #[must_use]
    pub fn day_prefix(date: NaiveDate) -> String {
        format!("{ORDER_NUMBER_TAG}{}", date.format("%Y%m%d"))
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ORDER_NUMBER_TAG}{}{:04}",
            self.date.format("%Y%m%d"),
            self.sequence
        )
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(ORDER_NUMBER_TAG)
            .ok_or(OrderNumberError::MissingTag)?;
        if rest.len() != DATE_DIGITS + SEQUENCE_DIGITS {
            return Err(OrderNumberError::InvalidSequence);
        }

        let (date_part, seq_part) = rest.split_at(DATE_DIGITS);
        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|_| OrderNumberError::InvalidDate)?;
        let sequence: u16 = seq_part
            .parse()
            .map_err(|_| OrderNumberError::InvalidSequence)?;

        Ok(Self { date, sequence })
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(n: OrderNumber) -> Self {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn formats_with_zero_padded_sequence() {
        let n = OrderNumber::new(day(2026, 8, 7), 42);
        assert_eq!(n.to_string(), "GM202608070042");
    }

    #[test]
    fn first_of_day_starts_at_one() {
        let n = OrderNumber::first_of_day(day(2026, 1, 2));
        assert_eq!(n.to_string(), "GM202601020001");
    }

    #[test]
    fn next_increments_within_the_same_day() {
        let today = day(2026, 8, 7);
        let highest = OrderNumber::new(today, 7);
        assert_eq!(OrderNumber::next(today, Some(&highest)).sequence(), 8);
    }

    #[test]
    fn next_resets_on_a_new_day() {
        let yesterday = OrderNumber::new(day(2026, 8, 6), 120);
        let n = OrderNumber::next(day(2026, 8, 7), Some(&yesterday));
        assert_eq!(n.sequence(), 1);
        assert_eq!(n.date(), day(2026, 8, 7));
    }

    #[test]
    fn next_without_existing_orders_is_first() {
        assert_eq!(OrderNumber::next(day(2026, 8, 7), None).sequence(), 1);
    }

    #[test]
    fn parses_its_own_output() {
        let n = OrderNumber::new(day(2026, 12, 31), 9999);
        let parsed: OrderNumber = n.to_string().parse().unwrap();
        assert_eq!(parsed, n);
    }

    #[test]
    fn rejects_foreign_tags_and_garbage() {
        assert_eq!(
            "HC202608070001".parse::<OrderNumber>(),
            Err(OrderNumberError::MissingTag)
        );
        assert_eq!(
            "GM2026080700".parse::<OrderNumber>(),
            Err(OrderNumberError::InvalidSequence)
        );
        assert_eq!(
            "GM202613400001".parse::<OrderNumber>(),
            Err(OrderNumberError::InvalidDate)
        );
        assert_eq!(
            "GM20260807abcd".parse::<OrderNumber>(),
            Err(OrderNumberError::InvalidSequence)
        );
    }

    #[test]
    fn day_prefix_matches_display() {
        let today = day(2026, 8, 7);
        let n = OrderNumber::first_of_day(today);
        assert!(n.to_string().starts_with(&OrderNumber::day_prefix(today)));
    }
}
