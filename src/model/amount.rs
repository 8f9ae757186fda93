//! Amount type for handling monetary values written with a currency symbol and thousands
//! separators.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values such as
//! `£1,234.56`, `1234.56` or `-£5.00`. Amounts are financial data, so a value that cannot be read
//! as a number is an error and is never turned into zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The currency symbol used in the expense sheets.
pub const DEFAULT_CURRENCY_SYMBOL: char = '£';

/// The thousands separator used in the expense sheets.
pub const DEFAULT_THOUSANDS_SEPARATOR: char = ',';

/// The largest magnitude accepted for a single amount. Any realistic number of rows summed
/// together stays far below `Decimal::MAX`.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000_000;

/// Represents how an amount was (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ symbol: Some('£'), commas: true }` -> `-£60,000.00`
///  - `AmountFormat{ symbol: None, commas: true }` -> `-60,000.00`
///  - `AmountFormat{ symbol: None, commas: false }` -> `-60000.00`
///  - `AmountFormat{ symbol: Some('$'), commas: false }` -> `-$60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct AmountFormat {
    /// The currency symbol, if one is present in the formatting.
    symbol: Option<char>,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// The default format has a currency symbol and commas: e.g. `-£60,000.00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat {
    symbol: Some(DEFAULT_CURRENCY_SYMBOL),
    commas: true,
};

/// Represents an amount of money.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use expense_dashboard::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("£1,234.56").unwrap();
/// assert_eq!(amount.to_string(), "£1,234.56");
/// assert_eq!(amount.value().to_string(), "1234.56");
/// ```
///
/// Value equivalency, but not absolute equivalency
/// ```
/// # use expense_dashboard::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("5000.00").unwrap();
/// let b = Amount::from_str("£5,000.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    /// Creates a new Amount that is written with `symbol` and commas.
    pub const fn with_symbol(value: Decimal, symbol: char) -> Self {
        Self {
            value,
            format: AmountFormat {
                symbol: Some(symbol),
                commas: true,
            },
        }
    }

    /// Parses `s` after removing every occurrence of `symbol` and `separator`.
    ///
    /// Blank input is an error: an empty amount cell is not the same thing as zero. So is a value
    /// whose magnitude exceeds `MAX_AMOUNT_UNITS`.
    pub fn parse_with(s: &str, symbol: char, separator: char) -> Result<Self, AmountError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Blank);
        }

        let without_symbol = trimmed.replace(symbol, "");
        let has_symbol = without_symbol.len() < trimmed.len();

        let cleaned = without_symbol.replace(separator, "");
        let has_commas = cleaned.len() < without_symbol.len();

        let value = Decimal::from_str(cleaned.trim()).map_err(AmountError::Decimal)?;
        if value.abs() > Decimal::from(MAX_AMOUNT_UNITS) {
            return Err(AmountError::TooLarge);
        }
        Ok(Amount {
            value,
            format: AmountFormat {
                symbol: has_symbol.then_some(symbol),
                commas: has_commas,
            },
        })
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value().is_sign_negative()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub enum AmountError {
    /// The cell was empty or only whitespace.
    Blank,
    /// What remained after cleaning was not a decimal number.
    Decimal(rust_decimal::Error),
    /// The magnitude is larger than `MAX_AMOUNT_UNITS`.
    TooLarge,
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Blank => f.write_str("Blank"),
            AmountError::Decimal(e) => Debug::fmt(e, f),
            AmountError::TooLarge => f.write_str("TooLarge"),
        }
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Blank => f.write_str("the amount is blank"),
            AmountError::Decimal(e) => Display::fmt(e, f),
            AmountError::TooLarge => write!(f, "the amount exceeds {MAX_AMOUNT_UNITS}"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AmountError::Blank | AmountError::TooLarge => None,
            AmountError::Decimal(e) => Some(e),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse_with(s, DEFAULT_CURRENCY_SYMBOL, DEFAULT_THOUSANDS_SEPARATOR)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            (String::from("-"), self.value().abs())
        } else {
            (String::new(), self.value())
        };

        let sym = self.format.symbol.map(String::from).unwrap_or_default();

        if self.format.commas {
            write!(
                f,
                "{sign}{sym}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{sym}{num}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let symbol = detect_symbol(&s).unwrap_or(DEFAULT_CURRENCY_SYMBOL);
        Amount::parse_with(&s, symbol, DEFAULT_THOUSANDS_SEPARATOR)
            .map_err(serde::de::Error::custom)
    }
}

/// The first character of `s` that cannot be part of a number, taken to be a currency symbol.
fn detect_symbol(s: &str) -> Option<char> {
    s.chars().find(|&c| {
        !(c.is_ascii_digit()
            || c.is_whitespace()
            || matches!(c, '-' | '+' | '.' | DEFAULT_THOUSANDS_SEPARATOR))
    })
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
