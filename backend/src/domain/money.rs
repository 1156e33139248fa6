//! Two-decimal currency amounts.
//!
//! Balances, stakes, prices, and ledger amounts are held as whole cents in an
//! `i64`, so arithmetic is exact. Decimal input (configuration strings, JSON
//! numbers) is rounded to two places half-away-from-zero on the way in by
//! parsing the shortest decimal representation rather than multiplying
//! floats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const CENTS_PER_UNIT: i64 = 100;

/// Errors raised while converting decimal input into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The input is not a plain decimal number.
    #[error("amount must be a decimal number, got `{input}`")]
    Malformed { input: String },
    /// The input is NaN or infinite.
    #[error("amount must be finite")]
    NonFinite,
    /// The amount does not fit the cent representation.
    #[error("amount is out of range")]
    OutOfRange,
}

/// Signed amount of currency in cents.
///
/// # Examples
/// ```
/// use wheel_backend::domain::Money;
///
/// let stake: Money = "1.005".parse().expect("valid amount");
/// assert_eq!(stake.cents(), 101);
/// assert_eq!(stake.to_string(), "1.01");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Construct from whole cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Construct from whole units.
    ///
    /// Returns `None` when the value overflows the cent representation.
    #[must_use]
    pub const fn from_units(units: i64) -> Option<Self> {
        match units.checked_mul(CENTS_PER_UNIT) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Convert a floating-point amount, rounding to cents half-away-from-zero.
    ///
    /// # Errors
    /// Returns [`MoneyError::NonFinite`] for NaN or infinities and
    /// [`MoneyError::OutOfRange`] for values beyond the cent range.
    pub fn from_decimal(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::NonFinite);
        }
        // `Display` for f64 yields the shortest round-tripping digits without
        // an exponent, so 1.005 is parsed as written.
        value.to_string().parse()
    }

    /// Whole cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Floating-point view used for JSON rendering.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "balances stay far below 2^53 cents"
    )]
    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Checked negation.
    #[must_use]
    pub const fn checked_neg(self) -> Option<Self> {
        match self.0.checked_neg() {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

fn digit_value(byte: u8) -> i64 {
    i64::from(byte - b'0')
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || MoneyError::Malformed {
            input: raw.to_owned(),
        };
        let trimmed = raw.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(malformed());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let whole_units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyError::OutOfRange)?
        };
        let mut digits = fraction.bytes();
        let tenths = digits.next().map_or(0, digit_value);
        let hundredths = digits.next().map_or(0, digit_value);
        let round_away = digits.next().is_some_and(|b| b >= b'5');

        let magnitude = whole_units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|cents| cents.checked_add(tenths * 10 + hundredths))
            .and_then(|cents| cents.checked_add(i64::from(round_away)))
            .ok_or(MoneyError::OutOfRange)?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyRepr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match MoneyRepr::deserialize(deserializer)? {
            MoneyRepr::Number(value) => Self::from_decimal(value),
            MoneyRepr::Text(text) => text.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}
