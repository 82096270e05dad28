//! Client for mobile-money aggregators that expose M-Pesa / e-Mola business-to-customer (B2C) transfers.
//!
//! The aggregator protocol is a two step affair:
//! 1. An OAuth client-credentials token is requested from the token endpoint. Tokens are cached by
//!    [`MobileMoneyApi`] until shortly before they expire.
//! 2. The transfer itself is a form-encoded POST of `client_id`, `phone`, `amount` and `reference` to the wallet's
//!    payment endpoint, authenticated with the bearer token.
//!
//! Response bodies differ between rails, so [`B2cPaymentResponse`] only extracts what callers need: whether the
//! transfer went through, the rail's transaction id and a human-readable message.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::MobileMoneyApi;
pub use config::MobileMoneyConfig;
pub use data_objects::{AccessToken, B2cPaymentRequest, B2cPaymentResponse, TokenResponse};
pub use error::MobileMoneyError;
