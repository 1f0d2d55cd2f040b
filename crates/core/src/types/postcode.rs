//! Dutch postcode type.
//!
//! A Dutch postcode is four digits (the first nonzero) followed by two
//! letters. Input is accepted case-insensitively with optional internal
//! whitespace; the canonical form is `"1234 AB"`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Postcode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostcodeError {
    /// The input string is empty.
    #[error("postcode cannot be empty")]
    Empty,
    /// The input is not four digits followed by two letters.
    #[error("postcode must be four digits followed by two letters (e.g. 1234 AB)")]
    InvalidFormat,
    /// The digit part starts with a zero, which no Dutch postcode does.
    #[error("postcode cannot start with a zero")]
    LeadingZero,
}

/// A validated Dutch postcode, stored in canonical `"1234 AB"` form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Postcode(String);

impl Postcode {
    /// Parse a `Postcode`, tolerating whitespace and lowercase letters.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is empty, malformed, or starts
    /// with a zero.
    pub fn parse(s: &str) -> Result<Self, PostcodeError> {
        if s.trim().is_empty() {
            return Err(PostcodeError::Empty);
        }

        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if compact.len() != 6 {
            return Err(PostcodeError::InvalidFormat);
        }

        let (digits, letters) = compact.split_at(4);
        if !digits.chars().all(|c| c.is_ascii_digit())
            || !letters.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(PostcodeError::InvalidFormat);
        }
        if digits.starts_with('0') {
            return Err(PostcodeError::LeadingZero);
        }

        Ok(Self(format!("{digits} {letters}")))
    }

    /// The canonical `"1234 AB"` representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The compact `"1234AB"` representation used in lookup queries.
    #[must_use]
    pub fn compact(&self) -> String {
        self.0.replace(' ', "")
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Postcode {
    type Err = PostcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_valid_inputs() {
        assert_eq!(Postcode::parse("1012NX").unwrap().as_str(), "1012 NX");
        assert_eq!(Postcode::parse("1012 NX").unwrap().as_str(), "1012 NX");
        assert_eq!(Postcode::parse("1012nx").unwrap().as_str(), "1012 NX");
        assert_eq!(Postcode::parse(" 1012  nx ").unwrap().as_str(), "1012 NX");
    }

    #[test]
    fn rejects_leading_zero() {
        assert_eq!(Postcode::parse("0012NX"), Err(PostcodeError::LeadingZero));
    }

    #[test]
    fn rejects_wrong_shape() {
        assert_eq!(Postcode::parse("1012N"), Err(PostcodeError::InvalidFormat));
        assert_eq!(Postcode::parse("101NXX"), Err(PostcodeError::InvalidFormat));
        assert_eq!(Postcode::parse("1012N8"), Err(PostcodeError::InvalidFormat));
        assert_eq!(Postcode::parse("1012NXX"), Err(PostcodeError::InvalidFormat));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Postcode::parse(""), Err(PostcodeError::Empty));
        assert_eq!(Postcode::parse("   "), Err(PostcodeError::Empty));
    }

    #[test]
    fn compact_strips_the_space() {
        assert_eq!(Postcode::parse("1012 NX").unwrap().compact(), "1012NX");
    }
}
