use crate::{
    db_types::{CompletedPayout, FailedPayout, NewVendorPayout, Payment, PaymentId, VendorPayout},
    payment_objects::PayoutQueryFilter,
    traits::{PaymentManagement, StoreError},
};

/// Storage for vendor payouts.
///
/// A payout attempt goes through exactly two writes: [`PayoutManagement::claim_payout`] before the money moves, and
/// one of [`PayoutManagement::complete_payout`] or [`PayoutManagement::fail_payout`] after. Each write is a single
/// transaction covering the `vendor_payouts` row, the payment's `vendorB2CPayment` metadata, the `payout_claims`
/// row for the payment, and an audit log entry.
///
/// Payouts belong to payments, so every payout store is also a payment store.
#[allow(async_fn_in_trait)]
pub trait PayoutManagement: PaymentManagement {
    /// Takes the exclusive payout claim for `payout.payment_id`, inserts the payout row in `processing` status and
    /// writes the `processing` state into the payment metadata.
    ///
    /// A claim can only be taken if there is none for the payment yet, or if the previous attempt failed. Otherwise
    /// nothing is written and the call fails with [`StoreError::PayoutInProgress`] or
    /// [`StoreError::PayoutAlreadyCompleted`].
    async fn claim_payout(&self, payout: NewVendorPayout) -> Result<VendorPayout, StoreError>;

    /// Marks the payout as `completed`, sets `paid_at` and the rail's transaction id, and releases the claim as
    /// completed. The claim is never released after this.
    async fn complete_payout(&self, payout_id: i64, state: CompletedPayout) -> Result<VendorPayout, StoreError>;

    /// Marks the payout as `failed` with the given error and releases the claim so that a later attempt can retry.
    async fn fail_payout(&self, payout_id: i64, state: FailedPayout) -> Result<VendorPayout, StoreError>;

    /// All payout attempts for a payment, oldest first.
    async fn fetch_payouts_for_payment(&self, payment_id: &PaymentId) -> Result<Vec<VendorPayout>, StoreError>;

    async fn search_payouts(&self, query: PayoutQueryFilter) -> Result<Vec<VendorPayout>, StoreError>;

    /// Payments in `completed` or `approved` status whose vendor has not been paid yet, oldest first.
    async fn fetch_payable_payments(&self) -> Result<Vec<Payment>, StoreError>;
}
