//! `SqliteDatabase` is a concrete implementation of a Paygator engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! SQLite only allows one writer at a time. Every write transaction here starts with a write statement, so the
//! write lock is taken up front rather than upgraded halfway through, which would fail under contention.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{audit_log, new_pool, payments, payouts};
use crate::{
    db_types::{
        AuditAction,
        AuditLogEntry,
        C2bTransaction,
        CompletedPayout,
        FailedPayout,
        NewPayment,
        NewVendorPayout,
        Payment,
        PaymentId,
        PaymentStatus,
        PayoutState,
        PayoutStatus,
        VendorPayout,
    },
    payment_objects::{PaymentQueryFilter, PayoutQueryFilter},
    traits::{PaygatorDatabase, PaymentManagement, PayoutManagement, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, creating the database file if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Finalizes a `processing` payout and mirrors the final state into the payment metadata.
    async fn finalize(
        &self,
        payout_id: i64,
        status: PayoutStatus,
        state: PayoutState,
        message: String,
    ) -> Result<VendorPayout, StoreError> {
        let (transaction_id, error_message, paid_at, action) = match &state {
            PayoutState::Completed(c) => {
                (c.transaction_id.as_deref(), None, Some(c.completed_at), AuditAction::PayoutCompleted)
            },
            PayoutState::Failed(f) => (None, Some(f.error.as_str()), None, AuditAction::PayoutFailed),
            _ => return Err(StoreError::DatabaseError(format!("Payout {payout_id} cannot be finalized as {status}"))),
        };
        let mut tx = self.pool.begin().await?;
        let payout =
            match payouts::finalize_payout(payout_id, status, transaction_id, error_message, paid_at, &mut tx).await? {
                Some(p) => p,
                None => {
                    return match payouts::fetch_payout(payout_id, &mut tx).await? {
                        Some(_) => Err(StoreError::PayoutAlreadyFinalized(payout_id)),
                        None => Err(StoreError::PayoutNotFound(payout_id)),
                    };
                },
            };
        let payment_id = payout.payment_id.clone();
        payouts::release_claim(&payment_id, status, &mut tx).await?;
        let mut payment = payments::fetch_payment(&payment_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::PaymentNotFound(payment_id.clone()))?;
        payment.metadata.vendor_b2c_payment = state;
        payments::update_metadata(&payment_id, &payment.metadata, &mut tx).await?;
        audit_log::insert_entry(Some(&payment_id), action, &message, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payout #{payout_id} for {payment_id} finalized as {status}");
        Ok(payout)
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::insert_payment(payment, &mut tx).await?;
        let message = format!("Payment of {} {} created", payment.amount, payment.currency);
        audit_log::insert_entry(Some(&payment.payment_id), AuditAction::PaymentCreated, &message, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment {} saved with id {}", payment.payment_id, payment.id);
        Ok(payment)
    }

    async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<Option<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::search_payments(query, &mut conn).await?;
        Ok(result)
    }

    async fn update_payment_status(
        &self,
        payment_id: &PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
        c2b_transaction: Option<C2bTransaction>,
    ) -> Result<Payment, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut payment = match payments::update_status(payment_id, from, to, &mut tx).await? {
            Some(p) => p,
            None => {
                let current = payments::fetch_payment(payment_id, &mut tx).await?;
                return match current {
                    Some(p) => Err(StoreError::PaymentStatusChanged {
                        payment_id: payment_id.clone(),
                        expected: from,
                        actual: p.status,
                    }),
                    None => Err(StoreError::PaymentNotFound(payment_id.clone())),
                };
            },
        };
        if let Some(c2b) = c2b_transaction {
            trace!("🗃️ Recording {} transaction for payment {payment_id}", c2b.provider);
            payment.metadata.c2b_transaction = Some(c2b);
            payment = payments::update_metadata(payment_id, &payment.metadata, &mut tx).await?;
        }
        let message = format!("Status changed from {from} to {to}");
        audit_log::insert_entry(Some(payment_id), AuditAction::PaymentStatusChanged, &message, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn fetch_audit_log(&self, limit: i64) -> Result<Vec<AuditLogEntry>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit_log::fetch_entries(limit, &mut conn).await?;
        Ok(entries)
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn claim_payout(&self, payout: NewVendorPayout) -> Result<VendorPayout, StoreError> {
        let mut tx = self.pool.begin().await?;
        payouts::take_claim(&payout.payment_id, &mut tx).await?;
        let payment_id = payout.payment_id.clone();
        let mut payment = payments::fetch_payment(&payment_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::PaymentNotFound(payment_id.clone()))?;
        let new_payout = payouts::insert_payout(&payout, &mut tx).await?;
        payouts::attach_claim(&payment_id, new_payout.id, &mut tx).await?;
        payment.metadata.vendor_b2c_payment = PayoutState::Processing(payout.processing_state());
        payments::update_metadata(&payment_id, &payment.metadata, &mut tx).await?;
        let message = format!(
            "Payout #{} of {} to {} initiated (ref {})",
            new_payout.id, new_payout.vendor_amount, new_payout.vendor_phone, new_payout.reference
        );
        audit_log::insert_entry(Some(&payment_id), AuditAction::PayoutInitiated, &message, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payout #{} for {payment_id} recorded as processing", new_payout.id);
        Ok(new_payout)
    }

    async fn complete_payout(&self, payout_id: i64, state: CompletedPayout) -> Result<VendorPayout, StoreError> {
        let message = match &state.transaction_id {
            Some(txid) => format!("Payout #{payout_id} of {} completed. Transaction {txid}", state.split.vendor_amount),
            None => format!("Payout #{payout_id} of {} completed", state.split.vendor_amount),
        };
        self.finalize(payout_id, PayoutStatus::Completed, PayoutState::Completed(state), message).await
    }

    async fn fail_payout(&self, payout_id: i64, state: FailedPayout) -> Result<VendorPayout, StoreError> {
        let message = format!("Payout #{payout_id} failed. {}", state.error);
        self.finalize(payout_id, PayoutStatus::Failed, PayoutState::Failed(state), message).await
    }

    async fn fetch_payouts_for_payment(&self, payment_id: &PaymentId) -> Result<Vec<VendorPayout>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let query = PayoutQueryFilter::default().with_payment_id(payment_id.clone());
        let result = payouts::search_payouts(query, &mut conn).await?;
        Ok(result)
    }

    async fn search_payouts(&self, query: PayoutQueryFilter) -> Result<Vec<VendorPayout>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = payouts::search_payouts(query, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_payable_payments(&self) -> Result<Vec<Payment>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = payments::fetch_payable_payments(&mut conn).await?;
        Ok(result)
    }
}

impl PaygatorDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ SQLite database migrations complete");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}
