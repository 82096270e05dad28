//! Small building blocks shared by every Paygator crate: money, percentages, secrets and env parsing helpers.
mod amount;
mod helpers;
mod percentage;
mod secret;

pub mod op;

pub use amount::{Amount, AmountConversionError, DEFAULT_CURRENCY_CODE};
pub use helpers::{parse_boolean_flag, parse_list};
pub use percentage::{Percentage, PercentageParseError};
pub use rust_decimal::Decimal;
pub use secret::Secret;
