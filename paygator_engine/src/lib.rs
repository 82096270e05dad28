//! Paygator Engine
//!
//! The Paygator engine holds the core logic of the Paygator payment gateway: customer payments reported by mobile
//! money rails, and the payout of each vendor's share once a payment completes. It is rail-agnostic; the actual
//! transfer of funds is delegated to a [`B2cDisbursement`] implementation.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`traits`], plus the [`SqliteDatabase`] and, with the `postgres` feature, `PostgresDatabase`
//!    backends). You should never need to access the database directly. Use the public API instead. The exception is
//!    the data types used in the database, which live in [`db_types`].
//! 2. The public API ([`mod@pge_api`]): [`PaymentApi`] for payments and [`PayoutFlowApi`] for vendor payouts.
//! 3. Events. When a payout completes or fails, an event is published to any hooks registered via
//!    [`events::EventHooks`].
pub mod db_types;
pub mod events;
pub mod helpers;
mod pge_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;
pub use pge_api::{
    errors::{PaymentApiError, PayoutError},
    payment_api::{PaymentApi, StatusUpdate},
    payment_objects,
    payout_flow_api::PayoutFlowApi,
    payout_objects::{
        DistributionResult,
        DistributionSummary,
        PayoutConfig,
        PayoutOptions,
        PayoutReceipt,
        DEFAULT_DISBURSEMENT_TIMEOUT,
    },
    split::compute_split,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    B2cDisbursement,
    DisbursementError,
    DisbursementRequest,
    DisbursementResponse,
    PaygatorDatabase,
    PaymentManagement,
    PayoutManagement,
    StoreError,
};
