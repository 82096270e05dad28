use futures::future::BoxFuture;
use log::*;
use mobile_money::{B2cPaymentRequest, MobileMoneyApi, MobileMoneyConfig, MobileMoneyError};
use paygator_engine::{
    events::{EventHandlers, EventHooks, PayoutCompletedEvent, PayoutFailedEvent},
    B2cDisbursement,
    DisbursementError,
    DisbursementRequest,
    DisbursementResponse,
};

pub const PAYOUT_EVENT_BUFFER_SIZE: usize = 25;

/// Sends vendor payouts through the mobile money aggregator.
#[derive(Clone)]
pub struct MobileMoneyDisburser {
    api: MobileMoneyApi,
}

impl MobileMoneyDisburser {
    pub fn new(config: MobileMoneyConfig) -> Result<Self, MobileMoneyError> {
        let api = MobileMoneyApi::new(config)?;
        Ok(Self { api })
    }
}

impl B2cDisbursement for MobileMoneyDisburser {
    async fn disburse(&self, request: DisbursementRequest) -> Result<DisbursementResponse, DisbursementError> {
        let DisbursementRequest { phone, amount, reference } = request;
        let request = B2cPaymentRequest::new(phone, amount, reference);
        let response = self.api.b2c_payment(&request).await.map_err(|e| DisbursementError(e.to_string()))?;
        if !response.success {
            warn!(
                "📲️ B2C transfer {} was declined ({}). {}",
                request.reference,
                response.status,
                response.message.as_deref().unwrap_or("No message")
            );
        }
        Ok(DisbursementResponse {
            success: response.success,
            transaction_id: response.transaction_id,
            message: response.message,
            data: Some(response.data),
        })
    }
}

/// Hooks that the server attaches to payout events.
///
/// Neither hook calls out to another service at the moment. They keep a record of every finalized payout in the
/// server log, under the `paygator::payouts` target, so that operators can follow payouts without querying the
/// database.
pub fn create_payout_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_payout_completed(|ev: PayoutCompletedEvent| -> BoxFuture<'static, ()> {
        let payout = ev.payout;
        Box::pin(async move {
            info!(
                target: "paygator::payouts",
                "📬️ Vendor paid for payment {}. {} sent to {} (ref {}, tx {})",
                payout.payment_id,
                payout.vendor_amount,
                payout.vendor_phone,
                payout.reference,
                payout.b2c_transaction_id.as_deref().unwrap_or("n/a")
            );
        })
    });
    hooks.on_payout_failed(|ev: PayoutFailedEvent| -> BoxFuture<'static, ()> {
        let PayoutFailedEvent { payout, error } = ev;
        Box::pin(async move {
            warn!(
                target: "paygator::payouts",
                "📬️ Vendor payout #{} for payment {} failed. The payment can be retried. {error}",
                payout.id,
                payout.payment_id
            );
        })
    });
    EventHandlers::new(PAYOUT_EVENT_BUFFER_SIZE, hooks)
}
