//! Exact resource quantities.
//!
//! A [`Quantity`] stores an amount as a whole number of milli-units, so
//! repeated subtraction during capacity accounting never drifts the way a
//! float would. The string form follows the Kubernetes quantity grammar
//! for the subset the adapter needs: plain and decimal numbers, the `m`
//! suffix, decimal SI suffixes (`k`, `M`, `G`, `T`) and binary suffixes
//! (`Ki`, `Mi`, `Gi`, `Ti`).

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const MILLIS_PER_UNIT: i128 = 1000;

/// Errors produced when parsing a quantity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity number: {0:?}")]
    Number(String),

    #[error("unknown quantity suffix: {0:?}")]
    Suffix(String),

    #[error("quantity {0:?} is finer than one milli-unit")]
    Precision(String),

    #[error("quantity {0:?} is out of range")]
    Overflow(String),
}

/// A resource amount with milli-unit precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    millis: i64,
}

impl Quantity {
    pub const ZERO: Quantity = Quantity { millis: 0 };

    /// A whole number of units.
    pub const fn from_units(units: i64) -> Self {
        Self {
            millis: units * 1000,
        }
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub const fn millis(&self) -> i64 {
        self.millis
    }

    pub const fn is_zero(&self) -> bool {
        self.millis == 0
    }

    pub const fn is_negative(&self) -> bool {
        self.millis < 0
    }

    pub fn checked_sub(self, rhs: Quantity) -> Option<Quantity> {
        self.millis.checked_sub(rhs.millis).map(Quantity::from_millis)
    }

    pub fn checked_add(self, rhs: Quantity) -> Option<Quantity> {
        self.millis.checked_add(rhs.millis).map(Quantity::from_millis)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity::from_millis(self.millis.saturating_add(rhs.millis))
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity::from_millis(self.millis.saturating_sub(rhs.millis))
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::from_millis(self.millis.saturating_neg())
    }
}

/// Multiplier for a suffix, expressed in milli-units per unit of the number.
fn suffix_multiplier(suffix: &str) -> Option<i128> {
    let m = match suffix {
        "m" => 1,
        "" => MILLIS_PER_UNIT,
        "k" => MILLIS_PER_UNIT * 1_000,
        "M" => MILLIS_PER_UNIT * 1_000_000,
        "G" => MILLIS_PER_UNIT * 1_000_000_000,
        "T" => MILLIS_PER_UNIT * 1_000_000_000_000,
        "Ki" => MILLIS_PER_UNIT << 10,
        "Mi" => MILLIS_PER_UNIT << 20,
        "Gi" => MILLIS_PER_UNIT << 30,
        "Ti" => MILLIS_PER_UNIT << 40,
        _ => return None,
    };
    Some(m)
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, unsigned) = match raw.as_bytes()[0] {
            b'-' => (true, &raw[1..]),
            b'+' => (false, &raw[1..]),
            _ => (false, raw),
        };

        let split = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(split);

        let multiplier =
            suffix_multiplier(suffix).ok_or_else(|| QuantityError::Suffix(suffix.to_string()))?;

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(QuantityError::Number(raw.to_string()));
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) || frac_part.len() > 18 {
            return Err(QuantityError::Number(raw.to_string()));
        }

        let overflow = || QuantityError::Overflow(raw.to_string());
        let scale = 10i128.pow(frac_part.len() as u32);
        let int_value: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let frac_value: i128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| overflow())?
        };

        let scaled = int_value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_value))
            .and_then(|v| v.checked_mul(multiplier))
            .ok_or_else(overflow)?;
        if scaled % scale != 0 {
            return Err(QuantityError::Precision(raw.to_string()));
        }

        let magnitude = scaled / scale;
        let signed = if negative { -magnitude } else { magnitude };
        let millis = i64::try_from(signed).map_err(|_| overflow())?;
        Ok(Quantity { millis })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis % 1000 == 0 {
            write!(f, "{}", self.millis / 1000)
        } else {
            write!(f, "{}m", self.millis)
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a quantity string or an integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                v.checked_mul(1000)
                    .map(Quantity::from_millis)
                    .ok_or_else(|| E::custom(QuantityError::Overflow(v.to_string())))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom(QuantityError::Overflow(v.to_string())))
                    .and_then(|v| self.visit_i64(v))
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}
