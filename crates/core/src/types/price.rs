//! Type-safe price representation in minor currency units.
//!
//! Prices are stored as an integer count of minor units (cents, paisa) and
//! only turned into a display string at the presentation edge. Legacy
//! display strings such as `"₹1,200"` can be parsed at the catalog boundary
//! with [`Price::parse_display`], which fails instead of producing a
//! not-a-number amount.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing or combining prices.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input could not be read as a price.
    #[error("malformed price: {0:?}")]
    Malformed(String),
    /// Arithmetic left the representable range.
    #[error("price arithmetic overflowed")]
    Overflow,
    /// Two prices in different currencies were combined.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Currency of the left-hand side.
        expected: CurrencyCode,
        /// Currency of the right-hand side.
        found: CurrencyCode,
    },
}

/// A price with currency information.
///
/// ## Examples
///
/// ```
/// use kiosk_core::{CurrencyCode, Price};
///
/// let price = Price::parse_display("₹1,200", CurrencyCode::INR).unwrap();
/// assert_eq!(price.amount_minor(), 120_000);
/// assert_eq!(price.display(), "₹1,200.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the smallest currency unit (e.g., cents for USD).
    amount_minor: i64,
    /// ISO 4217 currency code.
    currency: CurrencyCode,
}

impl Price {
    /// Create a price from an amount in minor units.
    #[must_use]
    pub const fn from_minor(amount_minor: i64, currency: CurrencyCode) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self::from_minor(0, currency)
    }

    /// Create a price from a decimal amount in the currency's standard unit.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Malformed`] if the amount has more fractional
    /// digits than the currency supports, or [`PriceError::Overflow`] if it
    /// does not fit in minor units.
    pub fn from_amount(amount: Decimal, currency: CurrencyCode) -> Result<Self, PriceError> {
        let scaled = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(PriceError::Overflow)?;

        if !scaled.fract().is_zero() {
            return Err(PriceError::Malformed(amount.to_string()));
        }

        let amount_minor = scaled.to_i64().ok_or(PriceError::Overflow)?;
        Ok(Self::from_minor(amount_minor, currency))
    }

    /// Parse a formatted display string such as `"$1,299.99"` or `"1,200"`.
    ///
    /// Strips surrounding whitespace, an optional leading `-`, the currency
    /// symbol and `,` grouping separators before reading a decimal number.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Malformed`] if anything other than digits and a
    /// single decimal point remains, or if there are more than two
    /// fractional digits.
    pub fn parse_display(input: &str, currency: CurrencyCode) -> Result<Self, PriceError> {
        let malformed = || PriceError::Malformed(input.to_string());

        let trimmed = input.trim();
        let (negative, rest) = trimmed
            .strip_prefix('-')
            .map_or((false, trimmed), |rest| (true, rest));
        let rest = rest.strip_prefix(currency.symbol()).unwrap_or(rest).trim();

        let digits: String = rest.chars().filter(|c| *c != ',').collect();
        if digits.is_empty()
            || !digits.chars().any(|c| c.is_ascii_digit())
            || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        {
            return Err(malformed());
        }

        let amount = Decimal::from_str(&digits).map_err(|_| malformed())?;
        let amount = if negative { -amount } else { amount };

        Self::from_amount(amount, currency).map_err(|err| match err {
            PriceError::Malformed(_) => malformed(),
            other => other,
        })
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// Currency of this price.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_minor, CurrencyCode::MINOR_DIGITS)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Add two prices of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::CurrencyMismatch`] for differing currencies and
    /// [`PriceError::Overflow`] if the sum does not fit.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        if self.currency != other.currency {
            return Err(PriceError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }

        self.amount_minor
            .checked_add(other.amount_minor)
            .map(|amount_minor| Self::from_minor(amount_minor, self.currency))
            .ok_or(PriceError::Overflow)
    }

    /// Multiply a unit price by a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the product does not fit.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, PriceError> {
        self.amount_minor
            .checked_mul(i64::from(quantity))
            .map(|amount_minor| Self::from_minor(amount_minor, self.currency))
            .ok_or(PriceError::Overflow)
    }

    /// Format for display (e.g., `"$1,299.99"`).
    #[must_use]
    pub fn display(&self) -> String {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        let major = abs / 100;
        let minor = abs % 100;

        format!(
            "{sign}{}{}.{minor:02}",
            self.currency.symbol(),
            group_thousands(major)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Insert `,` between groups of three digits.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    INR,
}

impl CurrencyCode {
    /// Number of minor-unit digits. Every supported currency uses two.
    pub const MINOR_DIGITS: u32 = 2;

    /// Display symbol placed before the amount.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::INR => "₹",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::INR => "INR",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            "INR" => Ok(Self::INR),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_strips_symbol_and_grouping() {
        let price = Price::parse_display("₹1,200", CurrencyCode::INR).unwrap();
        assert_eq!(price.amount_minor(), 120_000);

        let price = Price::parse_display(" $1,299.99 ", CurrencyCode::USD).unwrap();
        assert_eq!(price.amount_minor(), 129_999);

        let price = Price::parse_display("1,200", CurrencyCode::INR).unwrap();
        assert_eq!(price.amount(), Decimal::new(1200, 0));
    }

    #[test]
    fn test_parse_display_negative() {
        let price = Price::parse_display("-$5", CurrencyCode::USD).unwrap();
        assert_eq!(price.amount_minor(), -500);
    }

    #[test]
    fn test_parse_display_malformed() {
        for input in ["", "$", "abc", "12a", "1.2.3", "€10", ",", "1.999"] {
            assert!(
                matches!(
                    Price::parse_display(input, CurrencyCode::USD),
                    Err(PriceError::Malformed(_))
                ),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(
            Price::from_minor(123_456_789, CurrencyCode::USD).display(),
            "$1,234,567.89"
        );
        assert_eq!(Price::from_minor(5, CurrencyCode::GBP).display(), "£0.05");
        assert_eq!(Price::from_minor(-500, CurrencyCode::EUR).display(), "-€5.00");
        assert_eq!(Price::zero(CurrencyCode::INR).to_string(), "₹0.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let unit = Price::from_minor(1_999, CurrencyCode::USD);
        assert_eq!(unit.checked_mul(3).unwrap().amount_minor(), 5_997);
        assert_eq!(
            unit.checked_add(unit).unwrap().amount_minor(),
            3_998
        );

        let huge = Price::from_minor(i64::MAX, CurrencyCode::USD);
        assert_eq!(huge.checked_mul(2), Err(PriceError::Overflow));
        assert_eq!(huge.checked_add(unit), Err(PriceError::Overflow));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let usd = Price::from_minor(100, CurrencyCode::USD);
        let eur = Price::from_minor(100, CurrencyCode::EUR);
        assert_eq!(
            usd.checked_add(eur),
            Err(PriceError::CurrencyMismatch {
                expected: CurrencyCode::USD,
                found: CurrencyCode::EUR,
            })
        );
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let price = Price::from_minor(120_000, CurrencyCode::INR);
        let json = serde_json::to_value(price).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "amount_minor": 120_000, "currency": "INR" })
        );
    }
}
