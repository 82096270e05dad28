use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use paygator_engine::{
    db_types::{AuditAction, AuditLogEntry, PaymentId, PaymentStatus, PayoutStatus},
    events::EventProducers,
    payment_objects::{PaymentQueryFilter, PayoutQueryFilter},
    DisbursementResponse,
    PaymentApi,
    PayoutConfig,
    PayoutFlowApi,
};
use serde_json::json;

use super::{
    helpers::{claimed, completed, get_request, order_metadata, payment, post_request, Auth, VENDOR_PHONE},
    mocks::{MockDisburser, MockStore},
};
use crate::{
    middleware::ApiKeyMiddlewareFactory,
    routes::{AuditLogRoute, DistributePaymentsRoute, PayoutsForPaymentRoute, SearchPaymentsRoute, SearchPayoutsRoute},
};

/// Mirrors the admin scope in `create_server_instance`. The payment API and the payout API each get their own store.
fn configure_with(
    payments: MockStore,
    payouts: MockStore,
    disburser: MockDisburser,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let payment_api = PaymentApi::new(payments);
        let config = PayoutConfig::try_default().unwrap();
        let payout_api = PayoutFlowApi::new(payouts, disburser, config, EventProducers::default());
        let scope = web::scope("/admin/api")
            .wrap(ApiKeyMiddlewareFactory::new())
            .service(SearchPaymentsRoute::<MockStore>::new())
            .service(PayoutsForPaymentRoute::<MockStore, MockDisburser>::new())
            .service(SearchPayoutsRoute::<MockStore, MockDisburser>::new())
            .service(AuditLogRoute::<MockStore>::new())
            .service(DistributePaymentsRoute::<MockStore, MockDisburser>::new());
        cfg.service(scope).app_data(web::Data::new(payment_api)).app_data(web::Data::new(payout_api));
    }
}

fn untouched() -> (MockStore, MockStore, MockDisburser) {
    let mut payments = MockStore::new();
    payments.expect_search_payments().never();
    payments.expect_fetch_audit_log().never();
    let mut payouts = MockStore::new();
    payouts.expect_fetch_payable_payments().never();
    payouts.expect_search_payouts().never();
    let mut disburser = MockDisburser::new();
    disburser.expect_disburse().never();
    (payments, payouts, disburser)
}

#[actix_web::test]
async fn admin_routes_need_the_api_key() {
    let _ = env_logger::try_init().ok();
    for path in ["/admin/api/payments", "/admin/api/payouts", "/admin/api/logs", "/admin/api/payments/p1/payouts"] {
        let (payments, payouts, disburser) = untouched();
        let (status, body) = get_request(Auth::None, path, configure_with(payments, payouts, disburser)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body["success"], json!(false));
    }
    let (payments, payouts, disburser) = untouched();
    let (status, _) = post_request(
        Auth::Bearer("guess"),
        "/admin/api/distribute-payments",
        json!({}),
        configure_with(payments, payouts, disburser),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn search_payments_by_status() {
    let _ = env_logger::try_init().ok();
    let mut payments = MockStore::new();
    payments
        .expect_search_payments()
        .times(1)
        .withf(|q: &PaymentQueryFilter| {
            q.status == Some(vec![PaymentStatus::Completed]) && q.vendor_id.as_deref() == Some("vendor-7")
        })
        .returning(|_| Ok(vec![payment("pay_1", PaymentStatus::Completed, json!({}))]));
    let (status, body) = get_request(
        Auth::valid(),
        "/admin/api/payments?status=completed&vendorId=vendor-7",
        configure_with(payments, MockStore::new(), MockDisburser::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("1 payments"));
    assert_eq!(body["data"][0]["paymentId"], json!("pay_1"));
}

#[actix_web::test]
async fn invalid_status_filter() {
    let _ = env_logger::try_init().ok();
    let (payments, payouts, disburser) = untouched();
    let (status, body) =
        get_request(Auth::valid(), "/admin/api/payouts?status=lost", configure_with(payments, payouts, disburser))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn stuck_payouts() {
    let _ = env_logger::try_init().ok();
    let mut payouts = MockStore::new();
    payouts
        .expect_search_payouts()
        .times(1)
        .withf(|q: &PayoutQueryFilter| q.status == Some(vec![PayoutStatus::Processing]))
        .returning(|_| Ok(vec![]));
    let (status, body) = get_request(
        Auth::Header("test-api-key"),
        "/admin/api/payouts?status=processing",
        configure_with(MockStore::new(), payouts, MockDisburser::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn payouts_for_payment() {
    let _ = env_logger::try_init().ok();
    let mut payouts = MockStore::new();
    payouts
        .expect_fetch_payouts_for_payment()
        .withf(|id: &PaymentId| id.as_str() == "pay_9")
        .returning(|_| Ok(vec![]));
    let (status, body) = get_request(
        Auth::valid(),
        "/admin/api/payments/pay_9/payouts",
        configure_with(MockStore::new(), payouts, MockDisburser::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("0 payouts"));
}

#[actix_web::test]
async fn audit_log_limit() {
    let _ = env_logger::try_init().ok();
    let mut payments = MockStore::new();
    payments.expect_fetch_audit_log().times(1).withf(|limit| *limit == 5).returning(|_| {
        Ok(vec![AuditLogEntry {
            id: 12,
            payment_id: Some(PaymentId::new("pay_1")),
            action: AuditAction::PayoutCompleted,
            message: "Vendor paid".to_string(),
            created_at: Utc::now(),
        }])
    });
    let (status, body) = get_request(
        Auth::valid(),
        "/admin/api/logs?limit=5",
        configure_with(payments, MockStore::new(), MockDisburser::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["action"], json!("payout_completed"));
}

#[actix_web::test]
async fn distribute_payments() {
    let _ = env_logger::try_init().ok();
    let mut payouts = MockStore::new();
    payouts.expect_fetch_payable_payments().times(1).returning(|| {
        Ok(vec![
            payment("pay_1", PaymentStatus::Completed, order_metadata(VENDOR_PHONE, json!(85))),
            payment("pay_2", PaymentStatus::Approved, json!({})),
        ])
    });
    payouts.expect_fetch_payment().returning(|id| {
        let metadata = match id.as_str() {
            "pay_1" => order_metadata(VENDOR_PHONE, json!(85)),
            _ => json!({}),
        };
        Ok(Some(payment(id.as_str(), PaymentStatus::Completed, metadata)))
    });
    payouts.expect_claim_payout().times(1).returning(|p| Ok(claimed(p)));
    payouts.expect_complete_payout().times(1).returning(|id, state| Ok(completed("pay_1", id, state)));
    let mut disburser = MockDisburser::new();
    disburser.expect_disburse().times(1).returning(|_| Ok(DisbursementResponse::success(Some("TX-9".into()))));

    let (status, body) = post_request(
        Auth::valid(),
        "/admin/api/distribute-payments",
        json!({}),
        configure_with(MockStore::new(), payouts, disburser),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("1 of 2 payouts distributed"));
    let data = &body["data"];
    assert_eq!(data["total"], json!(2));
    assert_eq!(data["distributed"], json!(1));
    assert_eq!(data["failed"], json!(1));
    assert_eq!(data["results"][0], json!({"paymentId": "pay_1", "success": true, "transactionId": "TX-9"}));
    assert_eq!(data["results"][1]["success"], json!(false));
    assert_eq!(data["results"][1]["error"], json!("No vendor phone number is available for payment pay_2"));
    assert_eq!(data["results"][1]["errorCode"], json!("missing_phone"));
}
