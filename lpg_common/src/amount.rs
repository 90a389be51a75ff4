use std::{fmt::Display, iter::Sum, ops::Add, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The number of hundredths in one whole unit of loyalty points.
pub const CENTS_PER_UNIT: i64 = 100;

//--------------------------------------       Amount        ---------------------------------------------------------
/// A fixed-point monetary value with exactly two fractional digits.
///
/// Internally the value is a count of hundredths, so balance arithmetic is exact and the database can apply deltas
/// with plain integer addition. On the wire (JSON) it is a decimal number, e.g. `729.98`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, AddAssign, add_assign);
op!(inplace Amount, SubAssign, sub_assign);
op!(unary Amount, Neg, neg);

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct AmountConversionError(String);

impl Amount {
    /// Creates an amount from a raw number of hundredths.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount representing a whole number of units.
    pub const fn from_units(units: i64) -> Self {
        Self(units * CENTS_PER_UNIT)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    /// The raw number of hundredths.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Converts a floating point value to the nearest hundredth.
    pub fn try_from_f64(value: f64) -> Result<Self, AmountConversionError> {
        if !value.is_finite() {
            return Err(AmountConversionError(format!("{value} is not a finite number")));
        }
        let cents = (value * CENTS_PER_UNIT as f64).round();
        if cents > i64::MAX as f64 || cents < i64::MIN as f64 {
            return Err(AmountConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        let cents = cents as i64;
        Ok(Self(cents))
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }
}

impl From<i64> for Amount {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / CENTS_PER_UNIT as u64;
        let cents = abs % CENTS_PER_UNIT as u64;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    /// Parses a plain decimal string such as `"12"`, `"-3.5"` or `"729.98"`. More than two fractional digits is an
    /// error rather than a silent rounding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AmountConversionError(format!("'{s}' is not a valid decimal amount"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() || frac.len() > 2 {
            return Err(err());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let whole = whole.parse::<i64>().map_err(|_| err())?;
        let frac = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse::<i64>().map_err(|_| err())?,
        };
        let cents = whole.checked_mul(CENTS_PER_UNIT).and_then(|w| w.checked_add(frac)).ok_or_else(err)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % CENTS_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / CENTS_PER_UNIT)
        } else {
            serializer.serialize_f64(self.to_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Amount::try_from_f64(value).map_err(de::Error::custom)
    }
}
