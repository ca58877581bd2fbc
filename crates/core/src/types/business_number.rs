//! Korean business registration numbers (사업자등록번호).
//!
//! Headquarters accounts are identified by their registration number, and
//! branches reference their headquarters by it at sign-up.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Check-digit weights for the first nine digits.
const WEIGHTS: [u32; 9] = [1, 3, 7, 1, 3, 7, 1, 3, 5];

/// Errors that can occur when parsing a [`BusinessNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BusinessNumberError {
    /// Not exactly ten digits once hyphens are removed.
    #[error("business registration number must have 10 digits")]
    InvalidLength,
    /// Characters other than digits and hyphens.
    #[error("business registration number may only contain digits and hyphens")]
    InvalidCharacter,
    /// The tenth digit does not match the computed check digit.
    #[error("business registration number check digit mismatch")]
    ChecksumMismatch,
}

/// A validated 10-digit business registration number, stored without hyphens.
///
/// ```
/// use purewell_core::BusinessNumber;
///
/// let number = BusinessNumber::parse("220-81-62517").unwrap();
/// assert_eq!(number.as_str(), "2208162517");
/// assert_eq!(number.to_string(), "220-81-62517");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BusinessNumber(String);

impl BusinessNumber {
    /// Parse and validate a registration number.
    ///
    /// # Errors
    ///
    /// Returns an error for foreign characters, a digit count other than ten,
    /// or a failed check digit.
    pub fn parse(s: &str) -> Result<Self, BusinessNumberError> {
        let mut digits = Vec::with_capacity(10);
        for c in s.trim().chars() {
            match c.to_digit(10) {
                Some(d) => digits.push(d),
                None if c == '-' => {}
                None => return Err(BusinessNumberError::InvalidCharacter),
            }
        }

        let Ok(digits) = <[u32; 10]>::try_from(digits) else {
            return Err(BusinessNumberError::InvalidLength);
        };

        if check_digit(&digits) != digits[9] {
            return Err(BusinessNumberError::ChecksumMismatch);
        }

        Ok(Self(digits.iter().map(u32::to_string).collect()))
    }

    /// The ten digits without separators.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compute the check digit from the first nine digits.
fn check_digit(digits: &[u32; 10]) -> u32 {
    let weighted: u32 = digits.iter().zip(WEIGHTS).map(|(d, w)| d * w).sum();
    let carry = digits[8] * 5 / 10;
    (10 - (weighted + carry) % 10) % 10
}

impl fmt::Display for BusinessNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Always ten ASCII digits, so byte slicing is safe
        write!(f, "{}-{}-{}", &self.0[..3], &self.0[3..5], &self.0[5..])
    }
}

impl std::str::FromStr for BusinessNumber {
    type Err = BusinessNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers() {
        assert!(BusinessNumber::parse("2208162517").is_ok());
        assert!(BusinessNumber::parse("124-81-00998").is_ok());
        assert!(BusinessNumber::parse("101-86-01014").is_ok());
    }

    #[test]
    fn test_display_is_hyphenated() {
        let number = BusinessNumber::parse("1248100998").unwrap();
        assert_eq!(number.to_string(), "124-81-00998");
    }

    #[test]
    fn test_checksum_mismatch() {
        assert_eq!(
            BusinessNumber::parse("220-81-62518"),
            Err(BusinessNumberError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_invalid_length_and_characters() {
        assert_eq!(
            BusinessNumber::parse("220-81-6251"),
            Err(BusinessNumberError::InvalidLength)
        );
        assert_eq!(
            BusinessNumber::parse("22O-81-62517"),
            Err(BusinessNumberError::InvalidCharacter)
        );
    }
}
