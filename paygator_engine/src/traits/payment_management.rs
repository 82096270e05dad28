use crate::{
    db_types::{AuditLogEntry, C2bTransaction, NewPayment, Payment, PaymentId, PaymentStatus},
    payment_objects::PaymentQueryFilter,
    traits::StoreError,
};

/// The `PaymentManagement` trait defines behaviour for storing and querying customer payments.
///
/// Payment ids are unique and immutable. The `metadata` document is opaque to this trait, except for the
/// `c2bTransaction` key, which is maintained by [`PaymentManagement::update_payment_status`].
#[allow(async_fn_in_trait)]
pub trait PaymentManagement {
    /// Stores a new payment in `pending` status, and records a `payment_created` audit entry in the same transaction.
    ///
    /// Fails with [`StoreError::PaymentAlreadyExists`] if the payment id is taken.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError>;

    /// Fetches the payment with the given id. If no payment exists, `None` is returned.
    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<Option<Payment>, StoreError>;

    /// Fetches payments matching the filter, oldest first.
    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, StoreError>;

    /// Moves a payment from `from` to `to`, attaching the rail's transaction record to the metadata if one is given.
    ///
    /// This is a compare-and-set: if the stored status is no longer `from`, nothing is written and
    /// [`StoreError::PaymentStatusChanged`] is returned. Transition rules are the caller's responsibility.
    async fn update_payment_status(
        &self,
        payment_id: &PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        c2b_transaction: Option<C2bTransaction>,
    ) -> Result<Payment, StoreError>;

    /// The most recent `limit` audit log entries, newest first.
    async fn fetch_audit_log(&self, limit: i64) -> Result<Vec<AuditLogEntry>, StoreError>;
}
