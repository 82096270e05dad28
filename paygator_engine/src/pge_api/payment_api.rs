use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{AuditLogEntry, C2bTransaction, NewPayment, Payment, PaymentId, PaymentStatus},
    payment_objects::PaymentQueryFilter,
    pge_api::errors::PaymentApiError,
    traits::PaymentManagement,
};

/// Customer payment intake, rail status updates and payment queries.
pub struct PaymentApi<B> {
    db: B,
}

impl<B> Debug for PaymentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

/// The result of applying a rail status update.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub payment: Payment,
    /// `false` if the payment already had the requested status
    pub changed: bool,
}

impl<B> PaymentApi<B>
where B: PaymentManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Records a new `pending` payment. The payment id must not be in use.
    pub async fn create_payment(&self, payment: NewPayment) -> Result<Payment, PaymentApiError> {
        if !payment.amount.is_positive() {
            return Err(PaymentApiError::InvalidInput(format!("Payment amount must be positive, not {}", payment.amount)));
        }
        if payment.currency.trim().is_empty() {
            return Err(PaymentApiError::InvalidInput("A currency code is required".into()));
        }
        if !payment.metadata.vendor_b2c_payment.is_uninitiated() {
            return Err(PaymentApiError::InvalidInput("vendorB2CPayment cannot be set on a new payment".into()));
        }
        let payment = self.db.insert_payment(payment).await?;
        info!("💰️ Payment {} for {} {} created", payment.payment_id, payment.amount, payment.currency);
        Ok(payment)
    }

    pub async fn fetch_payment(&self, payment_id: &PaymentId) -> Result<Option<Payment>, PaymentApiError> {
        let payment = self.db.fetch_payment(payment_id).await?;
        Ok(payment)
    }

    pub async fn payment(&self, payment_id: &PaymentId) -> Result<Payment, PaymentApiError> {
        self.fetch_payment(payment_id).await?.ok_or_else(|| PaymentApiError::NotFound(payment_id.clone()))
    }

    pub async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, PaymentApiError> {
        trace!("💰️ Searching payments. {query}");
        let payments = self.db.search_payments(query).await?;
        Ok(payments)
    }

    /// Applies a status update reported by a payment rail.
    ///
    /// Repeating the current status is a no-op. Completed and approved payments never change status again, and a
    /// failed payment may only go back to `processing` when the customer retries.
    pub async fn update_status(
        &self,
        payment_id: &PaymentId,
        new_status: PaymentStatus,
        provider: &str,
        transaction_id: Option<String>,
    ) -> Result<StatusUpdate, PaymentApiError> {
        let payment = self.payment(payment_id).await?;
        let old_status = payment.status;
        if old_status == new_status {
            debug!("💰️ Payment {payment_id} already has status {new_status}. No action to take");
            return Ok(StatusUpdate { payment, changed: false });
        }
        if !old_status.can_transition_to(new_status) {
            warn!("💰️ {provider} tried to move payment {payment_id} from {old_status} to {new_status}. Rejected.");
            return Err(PaymentApiError::InvalidTransition {
                payment_id: payment_id.clone(),
                from: old_status,
                to: new_status,
            });
        }
        let c2b = transaction_id.map(|transaction_id| C2bTransaction {
            provider: provider.to_string(),
            transaction_id: Some(transaction_id),
            updated_at: Utc::now(),
        });
        let payment = self.db.update_payment_status(payment_id, old_status, new_status, c2b).await?;
        info!("💰️ Payment {payment_id} moved from {old_status} to {new_status} by {provider}");
        Ok(StatusUpdate { payment, changed: true })
    }

    pub async fn audit_log(&self, limit: i64) -> Result<Vec<AuditLogEntry>, PaymentApiError> {
        let entries = self.db.fetch_audit_log(limit.clamp(1, 1000)).await?;
        Ok(entries)
    }
}
