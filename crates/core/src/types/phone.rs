//! Korean telephone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// The input contains characters other than digits and separators.
    #[error("phone number may only contain digits, spaces, dots and hyphens")]
    InvalidCharacter,
    /// Domestic numbers start with a trunk prefix of 0.
    #[error("phone number must start with 0")]
    MissingTrunkPrefix,
    /// Wrong number of digits for the area code.
    #[error("phone number has an invalid length")]
    InvalidLength,
}

/// A domestic telephone number normalized to hyphenated form.
///
/// Seoul numbers use the two-digit `02` area code; everything else (mobile
/// `010`, regional `031`, `051`, ...) uses a three-digit prefix.
///
/// ```
/// use purewell_core::PhoneNumber;
///
/// assert_eq!(PhoneNumber::parse("01012345678").unwrap().as_str(), "010-1234-5678");
/// assert_eq!(PhoneNumber::parse("02 123 4567").unwrap().as_str(), "02-123-4567");
/// assert!(PhoneNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a phone number, accepting `-`, ` ` and `.` as separators.
    ///
    /// # Errors
    ///
    /// Returns an error for foreign characters, a missing leading 0, or a
    /// digit count that does not match the area code.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let mut digits = String::with_capacity(11);
        for c in s.trim().chars() {
            match c {
                '0'..='9' => digits.push(c),
                '-' | ' ' | '.' => {}
                _ => return Err(PhoneNumberError::InvalidCharacter),
            }
        }

        if !digits.starts_with('0') {
            return Err(PhoneNumberError::MissingTrunkPrefix);
        }

        let formatted = if digits.starts_with("02") {
            match digits.len() {
                9 => format!("02-{}-{}", &digits[2..5], &digits[5..]),
                10 => format!("02-{}-{}", &digits[2..6], &digits[6..]),
                _ => return Err(PhoneNumberError::InvalidLength),
            }
        } else {
            match digits.len() {
                10 => format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]),
                11 => format!("{}-{}-{}", &digits[..3], &digits[3..7], &digits[7..]),
                _ => return Err(PhoneNumberError::InvalidLength),
            }
        };

        Ok(Self(formatted))
    }

    /// Returns the hyphenated number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number with separators removed, as payment gateways expect.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_numbers() {
        let phone = PhoneNumber::parse("010-9876-5432").unwrap();
        assert_eq!(phone.as_str(), "010-9876-5432");
        assert_eq!(phone.digits(), "01098765432");
    }

    #[test]
    fn test_seoul_numbers() {
        assert_eq!(PhoneNumber::parse("021234567").unwrap().as_str(), "02-123-4567");
        assert_eq!(
            PhoneNumber::parse("02.1234.5678").unwrap().as_str(),
            "02-1234-5678"
        );
        assert_eq!(PhoneNumber::parse("0212345678").unwrap().digits(), "0212345678");
    }

    #[test]
    fn test_regional_numbers() {
        assert_eq!(
            PhoneNumber::parse("031 123 4567").unwrap().as_str(),
            "031-123-4567"
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            PhoneNumber::parse("+82 10 1234 5678"),
            Err(PhoneNumberError::InvalidCharacter)
        );
        assert_eq!(
            PhoneNumber::parse("1012345678"),
            Err(PhoneNumberError::MissingTrunkPrefix)
        );
        assert_eq!(
            PhoneNumber::parse("010123"),
            Err(PhoneNumberError::InvalidLength)
        );
        assert_eq!(
            PhoneNumber::parse("02123"),
            Err(PhoneNumberError::InvalidLength)
        );
    }
}
