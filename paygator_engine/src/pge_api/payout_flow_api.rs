use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{NewVendorPayout, Payment, PaymentId, VendorPayout},
    events::{EventProducers, PayoutCompletedEvent, PayoutFailedEvent},
    helpers::generate_reference,
    payment_objects::PayoutQueryFilter,
    pge_api::{
        errors::PayoutError,
        payout_objects::{DistributionSummary, PayoutConfig, PayoutOptions, PayoutReceipt},
        split::compute_split,
    },
    traits::{B2cDisbursement, DisbursementRequest, PayoutManagement},
};

/// `PayoutFlowApi` pays vendors their share of completed customer payments.
///
/// A payout attempt is recorded before any money moves, and every attempt, successful or not, leaves its own
/// `vendor_payouts` row. Only one attempt per payment can be in flight at a time, and once an attempt has completed,
/// no further attempts are made for that payment.
pub struct PayoutFlowApi<B, D> {
    db: B,
    disburser: D,
    config: PayoutConfig,
    producers: EventProducers,
}

impl<B, D> Debug for PayoutFlowApi<B, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutFlowApi ({:?})", self.config)
    }
}

impl<B, D> PayoutFlowApi<B, D> {
    pub fn new(db: B, disburser: D, config: PayoutConfig, producers: EventProducers) -> Self {
        Self { db, disburser, config, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn config(&self) -> &PayoutConfig {
        &self.config
    }
}

impl<B, D> PayoutFlowApi<B, D>
where
    B: PayoutManagement,
    D: B2cDisbursement,
{
    /// Pays the vendor for a single payment.
    ///
    /// Validation failures (unknown payment, wrong status, already paid, bad split or phone) are reported before
    /// anything is written. Once the attempt has been recorded, a failed disbursement is finalized as `failed` and
    /// reported as [`PayoutError::DisbursementFailed`]; the payment can then be retried.
    pub async fn process_payout(
        &self,
        payment_id: &PaymentId,
        options: PayoutOptions,
    ) -> Result<PayoutReceipt, PayoutError> {
        let payment =
            self.db.fetch_payment(payment_id).await?.ok_or_else(|| PayoutError::NotFound(payment_id.clone()))?;
        let new_payout = self.prepare_payout(&payment, &options)?;
        let payout = self.db.claim_payout(new_payout.clone()).await?;
        info!(
            "💸️ Payout #{} for payment {payment_id} claimed. Sending {} to {} ({})",
            payout.id, payout.vendor_amount, payout.vendor_phone, payout.reference
        );
        let request = DisbursementRequest {
            phone: new_payout.vendor_phone.clone(),
            amount: new_payout.split.vendor_amount,
            reference: new_payout.reference.clone(),
        };
        let processing = new_payout.processing_state();
        match self.disburse(request).await {
            Ok(transaction_id) => {
                let state = processing.complete(transaction_id, Utc::now());
                let payout = self.db.complete_payout(payout.id, state).await.map_err(|e| {
                    error!(
                        "💸️ Payout #{} for payment {payment_id} was disbursed but could not be marked as completed. \
                         It needs to be reconciled manually. {e}",
                        payout.id
                    );
                    PayoutError::from(e)
                })?;
                info!("💸️ Payout #{} for payment {payment_id} completed. {:?}", payout.id, payout.b2c_transaction_id);
                self.call_payout_completed_hook(&payout).await;
                Ok(PayoutReceipt::from(payout))
            },
            Err(message) => {
                let state = processing.fail(message.clone(), Utc::now());
                let payout = self.db.fail_payout(payout.id, state).await.map_err(|e| {
                    error!("💸️ Payout #{} for payment {payment_id} failed, but could not be marked as such. {e}", payout.id);
                    PayoutError::from(e)
                })?;
                warn!("💸️ Payout #{} for payment {payment_id} failed. {message}", payout.id);
                self.call_payout_failed_hook(&payout, &message).await;
                Err(PayoutError::DisbursementFailed(message))
            },
        }
    }

    /// Runs the eligibility, idempotency, split and phone checks, and builds the payout record to claim.
    fn prepare_payout(&self, payment: &Payment, options: &PayoutOptions) -> Result<NewVendorPayout, PayoutError> {
        let payment_id = &payment.payment_id;
        if !payment.status.is_payable() {
            debug!("💸️ Payment {payment_id} is {}. No payout possible", payment.status);
            return Err(PayoutError::InvalidState { payment_id: payment_id.clone(), status: payment.status });
        }
        if payment.metadata.vendor_b2c_payment.is_completed() {
            debug!("💸️ The vendor for payment {payment_id} has already been paid");
            return Err(PayoutError::AlreadyPaid(payment_id.clone()));
        }
        let split = compute_split(payment.amount, &payment.metadata, options.commission_percentage.as_deref())?;
        let phone = options
            .vendor_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .or_else(|| payment.metadata.vendor_phone())
            .ok_or_else(|| PayoutError::MissingPhone(payment_id.clone()))?;
        let vendor_phone = self.config.phone_rules.to_local(&phone)?;
        let initiated_at = Utc::now();
        let reference = generate_reference(payment_id.as_str(), initiated_at, self.config.reference_max_len);
        Ok(NewVendorPayout {
            payment_id: payment_id.clone(),
            vendor_id: payment.vendor_id.clone(),
            split,
            vendor_phone,
            reference,
            initiated_at,
        })
    }

    /// Calls the rail, bounded by the configured timeout. Every way this can go wrong is folded into an error
    /// message for the payout record.
    async fn disburse(&self, request: DisbursementRequest) -> Result<Option<String>, String> {
        let timeout = self.config.disbursement_timeout;
        match tokio::time::timeout(timeout, self.disburser.disburse(request)).await {
            Ok(Ok(response)) if response.success => Ok(response.transaction_id),
            Ok(Ok(response)) => {
                Err(response.message.unwrap_or_else(|| "The disbursement was declined by the provider".to_string()))
            },
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("The disbursement request timed out after {}s", timeout.as_secs_f32())),
        }
    }

    /// Attempts a payout for every payment that is complete but whose vendor has not been paid yet.
    ///
    /// Payments are processed one at a time, and a failure for one payment never stops the batch.
    pub async fn distribute_all(&self) -> Result<DistributionSummary, PayoutError> {
        let payments = self.db.fetch_payable_payments().await?;
        info!("💸️ Distributing vendor payouts for {} payments", payments.len());
        let mut summary = DistributionSummary::default();
        for payment in payments {
            let payment_id = payment.payment_id;
            match self.process_payout(&payment_id, PayoutOptions::default()).await {
                Ok(receipt) => summary.record_success(payment_id, receipt.transaction_id),
                Err(e) => {
                    debug!("💸️ Payout for {payment_id} was not made. {e}");
                    summary.record_failure(payment_id, &e)
                },
            }
        }
        info!(
            "💸️ Distribution complete. {} of {} payouts succeeded, {} failed",
            summary.distributed, summary.total, summary.failed
        );
        Ok(summary)
    }

    pub async fn payouts_for_payment(&self, payment_id: &PaymentId) -> Result<Vec<VendorPayout>, PayoutError> {
        let payouts = self.db.fetch_payouts_for_payment(payment_id).await?;
        Ok(payouts)
    }

    pub async fn search_payouts(&self, query: PayoutQueryFilter) -> Result<Vec<VendorPayout>, PayoutError> {
        trace!("💸️ Searching payouts. {query}");
        let payouts = self.db.search_payouts(query).await?;
        Ok(payouts)
    }

    async fn call_payout_completed_hook(&self, payout: &VendorPayout) {
        for emitter in &self.producers.payout_completed_producer {
            debug!("💸️ Notifying payout completed hook subscribers");
            emitter.publish_event(PayoutCompletedEvent::new(payout.clone())).await;
        }
    }

    async fn call_payout_failed_hook(&self, payout: &VendorPayout, error: &str) {
        for emitter in &self.producers.payout_failed_producer {
            debug!("💸️ Notifying payout failed hook subscribers");
            emitter.publish_event(PayoutFailedEvent::new(payout.clone(), error.to_string())).await;
        }
    }
}
