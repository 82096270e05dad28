use std::{
    fmt::{self, Display},
    iter::Sum,
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::{op, Percentage};

pub const DEFAULT_CURRENCY_CODE: &str = "MZN";

/// Number of decimal places in the minor unit (centavos for MZN).
const MINOR_UNIT_SCALE: u32 = 2;

//--------------------------------------        Amount        ---------------------------------------------------------
/// A monetary amount, held as an integer number of minor units so that no floating-point drift can creep into
/// stored balances. On the wire (JSON) amounts are written in major units, e.g. `85.5`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Amount(i64);

op!(binary Amount, Add, add);
op!(binary Amount, Sub, sub);
op!(inplace Amount, AddAssign, add_assign);
op!(inplace Amount, SubAssign, sub_assign);
op!(unary Amount, Neg, neg);

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for Amount {
    fn from(minor_units: i64) -> Self {
        Self(minor_units)
    }
}

impl Amount {
    pub fn from_minor(minor_units: i64) -> Self {
        Self(minor_units)
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * 10i64.pow(MINOR_UNIT_SCALE))
    }

    /// The amount in minor units.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The amount in major units, exactly.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    /// Converts a major-unit decimal into an amount, rounding half away from zero to the nearest minor unit.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, AmountConversionError> {
        let scale = Decimal::from(10i64.pow(MINOR_UNIT_SCALE));
        value
            .checked_mul(scale)
            .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|v| v.to_i64())
            .map(Self)
            .ok_or_else(|| AmountConversionError(value.to_string()))
    }

    /// `self * pct / 100`, rounded to the nearest minor unit.
    pub fn portion(&self, pct: Percentage) -> Result<Self, AmountConversionError> {
        let share = self
            .to_decimal()
            .checked_mul(pct.value())
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| AmountConversionError(format!("{self} x {pct}%")))?;
        Self::try_from_decimal(share)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for Amount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s.trim()).map_err(|e| AmountConversionError(format!("{s}: {e}")))?;
        Self::try_from_decimal(d)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let major = self.to_decimal().to_f64().ok_or_else(|| serde::ser::Error::custom("amount out of range"))?;
        serializer.serialize_f64(major)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> de::Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an amount in major currency units, as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::try_from_decimal(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Amount::try_from_decimal(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        let d = Decimal::try_from(v).map_err(E::custom)?;
        Amount::try_from_decimal(d).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }
}
