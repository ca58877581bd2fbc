//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog and order amounts are whole won. `Decimal` is used anyway so
//! percentage arithmetic in checkout never touches floating point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (won, not jeon).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a won price.
    #[must_use]
    pub const fn won(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::KRW)
    }

    /// Format for display, e.g. `₩12,000`.
    ///
    /// ```
    /// use purewell_core::Price;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Price::won(Decimal::from(1_250_000)).display(), "₩1,250,000");
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        let code = self.currency_code;
        let rounded = self.amount.round_dp(code.minor_units());
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((&text, ""));

        let mut out = String::with_capacity(text.len() + 4);
        if negative {
            out.push('-');
        }
        out.push_str(code.symbol());
        out.push_str(&group_thousands(whole));
        if code.minor_units() > 0 {
            out.push('.');
            out.push_str(&format!(
                "{fraction:0<width$}",
                width = code.minor_units() as usize
            ));
        }
        out
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KRW,
    USD,
}

impl CurrencyCode {
    /// Currency symbol used for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::KRW => "₩",
            Self::USD => "$",
        }
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::KRW => 0,
            Self::USD => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_won_display() {
        assert_eq!(Price::won(Decimal::from(12_000)).display(), "₩12,000");
        assert_eq!(Price::won(Decimal::from(500)).display(), "₩500");
        assert_eq!(Price::won(Decimal::ZERO).display(), "₩0");
        assert_eq!(Price::won(Decimal::from(100_000)).display(), "₩100,000");
    }

    #[test]
    fn test_negative_display() {
        assert_eq!(Price::won(Decimal::from(-3_000)).display(), "-₩3,000");
    }

    #[test]
    fn test_fractional_won_rounds() {
        assert_eq!(Price::won(Decimal::new(99_995, 1)).display(), "₩10,000");
    }

    #[test]
    fn test_usd_display() {
        let price = Price::new(Decimal::new(123_450, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$1,234.50");
    }

    #[test]
    fn test_default_currency_is_won() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::KRW);
    }
}
