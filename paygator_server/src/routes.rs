//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (database calls, requests to the
//! mobile money rails, etc.) must be awaited, so that the worker can handle other requests in the meantime.
//!
//! All responses, successful or not, use the [`JsonResponse`] envelope.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use paygator_engine::{
    db_types::PaymentId,
    traits::{B2cDisbursement, PaymentManagement, PayoutManagement},
    PaymentApi,
    PayoutFlowApi,
};

use crate::{
    config::ProxyConfig,
    data_objects::{
        AuditLogParams,
        JsonResponse,
        NewPaymentRequest,
        PaymentSearchParams,
        PayoutSearchParams,
        ProcessPayoutRequest,
        WebhookNotification,
        DEFAULT_AUDIT_LOG_LIMIT,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires api_key) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::ApiKeyMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payments" impl PaymentManagement);
/// Records a new customer payment. The payment starts out as `pending`. If no `paymentId` is supplied, one is
/// generated.
pub async fn create_payment<B: PaymentManagement>(
    body: web::Json<NewPaymentRequest>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment = body.into_inner().into_new_payment();
    debug!("💻️ POST new payment {}", payment.payment_id);
    let payment = api.create_payment(payment).await?;
    Ok(HttpResponse::Created().json(JsonResponse::with_data("Payment created", payment)))
}

route!(payment_by_id => Get "/payments/{payment_id}" impl PaymentManagement);
pub async fn payment_by_id<B: PaymentManagement>(
    path: web::Path<PaymentId>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ GET payment {payment_id}");
    let payment = api.payment(&payment_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::with_data("Payment found", payment)))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(payment_webhook => Post "/webhooks/{provider}" impl PaymentManagement);
/// Status updates from the payment rails.
///
/// Repeated notifications for the same status are acknowledged without changing anything, so rails can safely
/// redeliver. Updates that would move a payment backwards (e.g. out of `completed`) are rejected with a 400.
pub async fn payment_webhook<B: PaymentManagement>(
    req: HttpRequest,
    path: web::Path<String>,
    config: web::Data<ProxyConfig>,
    body: web::Json<WebhookNotification>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let provider = path.into_inner();
    let WebhookNotification { payment_id, status, transaction_id } = body.into_inner();
    let peer_addr = get_remote_ip(&req, config.use_x_forwarded_for);
    info!("💻️ {provider} webhook from {peer_addr:?}: payment {payment_id} is now {status}");
    let update = api.update_status(&payment_id, status, &provider, transaction_id).await?;
    let message = if update.changed { "Payment status updated" } else { "Payment status unchanged" };
    Ok(HttpResponse::Ok().json(JsonResponse::with_data(message, update.payment)))
}

//----------------------------------------------   Vendor payouts  ----------------------------------------------------
route!(process_vendor_b2c => Post "/payments/process-vendor-b2c" impl PayoutManagement, B2cDisbursement where requires api_key);
/// Pays the vendor their share of a completed payment.
///
/// The optional `commissionPercentage` replaces the platform commission for this payout only, and `vendorPhone`
/// replaces the phone number stored on the order.
///
/// If the disbursement itself fails, the attempt is recorded as failed and a 500 is returned, with
/// `data: {status: "failed", error}`. The payout can then be retried by calling this endpoint again.
pub async fn process_vendor_b2c<B, D>(
    body: web::Json<ProcessPayoutRequest>,
    api: web::Data<PayoutFlowApi<B, D>>,
) -> Result<HttpResponse, ServerError>
where
    B: PayoutManagement,
    D: B2cDisbursement,
{
    let request = body.into_inner();
    info!("💻️ Vendor payout requested for payment {}", request.payment_id);
    let receipt = api.process_payout(&request.payment_id, request.options()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::with_data("Vendor payout completed", receipt)))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(search_payments => Get "/payments" impl PaymentManagement);
pub async fn search_payments<B: PaymentManagement>(
    query: web::Query<PaymentSearchParams>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payments = api.search_payments(query.into_inner().into()).await?;
    debug!("💻️ Payment search returned {} results", payments.len());
    Ok(HttpResponse::Ok().json(JsonResponse::with_data(format!("{} payments", payments.len()), payments)))
}

route!(payouts_for_payment => Get "/payments/{payment_id}/payouts" impl PayoutManagement, B2cDisbursement);
/// Every payout attempt for a payment, oldest first.
pub async fn payouts_for_payment<B, D>(
    path: web::Path<PaymentId>,
    api: web::Data<PayoutFlowApi<B, D>>,
) -> Result<HttpResponse, ServerError>
where
    B: PayoutManagement,
    D: B2cDisbursement,
{
    let payment_id = path.into_inner();
    let payouts = api.payouts_for_payment(&payment_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::with_data(format!("{} payouts", payouts.len()), payouts)))
}

route!(search_payouts => Get "/payouts" impl PayoutManagement, B2cDisbursement);
/// Searches payout attempts. `?status=processing` lists payouts that never received an answer from the rail and
/// need to be reconciled by hand.
pub async fn search_payouts<B, D>(
    query: web::Query<PayoutSearchParams>,
    api: web::Data<PayoutFlowApi<B, D>>,
) -> Result<HttpResponse, ServerError>
where
    B: PayoutManagement,
    D: B2cDisbursement,
{
    let payouts = api.search_payouts(query.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::with_data(format!("{} payouts", payouts.len()), payouts)))
}

route!(audit_log => Get "/logs" impl PaymentManagement);
pub async fn audit_log<B: PaymentManagement>(
    query: web::Query<AuditLogParams>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LOG_LIMIT);
    let entries = api.audit_log(limit).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::with_data(format!("{} entries", entries.len()), entries)))
}

route!(distribute_payments => Post "/distribute-payments" impl PayoutManagement, B2cDisbursement);
/// Pays out every completed payment whose vendor has not been paid yet. Individual failures are reported in the
/// results and never abort the batch.
pub async fn distribute_payments<B, D>(api: web::Data<PayoutFlowApi<B, D>>) -> Result<HttpResponse, ServerError>
where
    B: PayoutManagement,
    D: B2cDisbursement,
{
    info!("💻️ Batch distribution of vendor payouts requested");
    let summary = api.distribute_all().await?;
    let message = format!("{} of {} payouts distributed", summary.distributed, summary.total);
    Ok(HttpResponse::Ok().json(JsonResponse::with_data(message, summary)))
}
