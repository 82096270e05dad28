use std::{
    fmt::{self, Display},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A percentage in fixed-point decimal. No range is enforced on construction; callers that need `[0, 100]` check
/// [`Percentage::is_within_bounds`] and report their own error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(Decimal);

#[derive(Debug, Clone, Error)]
#[error("Not a valid percentage: {0}")]
pub struct PercentageParseError(String);

impl Percentage {
    pub fn new(value: Decimal) -> Self {
        Self(value.normalize())
    }

    pub fn hundred() -> Self {
        Self(Decimal::ONE_HUNDRED)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `100 - self`
    pub fn complement(&self) -> Self {
        Self::new(Decimal::ONE_HUNDRED - self.0)
    }

    pub fn is_within_bounds(&self) -> bool {
        self.0 >= Decimal::ZERO && self.0 <= Decimal::ONE_HUNDRED
    }
}

impl From<u32> for Percentage {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Percentage {
    type Err = PercentageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Decimal::from_str(s).map(Self::new).map_err(|e| PercentageParseError(format!("'{s}' ({e})")))
    }
}

impl TryFrom<String> for Percentage {
    type Error = PercentageParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0.to_f64().ok_or_else(|| serde::ser::Error::custom("percentage out of range"))?;
        serializer.serialize_f64(v)
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PercentageVisitor)
    }
}

struct PercentageVisitor;

impl<'de> de::Visitor<'de> for PercentageVisitor {
    type Value = Percentage;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a percentage as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Percentage, E> {
        Ok(Percentage::new(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Percentage, E> {
        Ok(Percentage::new(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Percentage, E> {
        Decimal::try_from(v).map(Percentage::new).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Percentage, E> {
        v.parse().map_err(E::custom)
    }
}
