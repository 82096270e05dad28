use thiserror::Error;

use crate::{
    db_types::{PaymentId, PaymentStatus},
    traits::PayoutManagement,
};

/// This trait defines the highest level of behaviour for backends supporting the Paygator engine.
#[allow(async_fn_in_trait)]
pub trait PaygatorDatabase: Clone + PayoutManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Brings the schema up to date.
    async fn migrate(&self) -> Result<(), StoreError>;

    async fn close(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert payment, since it already exists with id {0}")]
    PaymentAlreadyExists(PaymentId),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(PaymentId),
    #[error("The requested payout (id {0}) does not exist")]
    PayoutNotFound(i64),
    #[error("Payment {payment_id} was expected to be {expected}, but it is {actual}")]
    PaymentStatusChanged { payment_id: PaymentId, expected: PaymentStatus, actual: PaymentStatus },
    #[error("A vendor payout for payment {0} is already in progress")]
    PayoutInProgress(PaymentId),
    #[error("The vendor for payment {0} has already been paid")]
    PayoutAlreadyCompleted(PaymentId),
    #[error("Payout {0} has already been finalized")]
    PayoutAlreadyFinalized(i64),
    #[error("Could not (de)serialize payment metadata. {0}")]
    MetadataError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        StoreError::DatabaseError(format!("Migration failed. {e}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::MetadataError(e.to_string())
    }
}
