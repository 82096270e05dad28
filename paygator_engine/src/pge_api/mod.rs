//! # Paygator engine public API
//!
//! The `pge_api` module exposes the programmatic API of the engine.
//!
//! * [`payment_api`] handles customer payments: intake, status updates reported by the payment rails, and queries.
//! * [`payout_flow_api`] pays vendors their share of completed payments, one at a time or as a batch.
//! * [`split`] holds the commission arithmetic.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs.
//!
//! ```rust,ignore
//! use paygator_engine::{PayoutConfig, PayoutFlowApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url("sqlite://data/paygator.db", 5).await?;
//! let api = PayoutFlowApi::new(db, my_disburser, PayoutConfig::try_default()?, EventProducers::default());
//! let receipt = api.process_payout(&"pay_1".into(), Default::default()).await?;
//! ```
pub mod errors;
pub mod payment_api;
pub mod payment_objects;
pub mod payout_flow_api;
pub mod payout_objects;
pub mod split;
