use actix_web::{http::StatusCode, web, web::ServiceConfig};
use paygator_engine::{
    db_types::{PaymentId, PaymentStatus},
    events::EventProducers,
    DisbursementError,
    DisbursementResponse,
    PayoutConfig,
    PayoutFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{claimed, completed, failed, order_metadata, payment, post_request, Auth, VENDOR_PHONE},
    mocks::{MockDisburser, MockStore},
};
use crate::routes::ProcessVendorB2cRoute;

const PATH: &str = "/payments/process-vendor-b2c";

fn configure_with(store: MockStore, disburser: MockDisburser) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let config = PayoutConfig::try_default().unwrap();
        let api = PayoutFlowApi::new(store, disburser, config, EventProducers::default());
        cfg.service(ProcessVendorB2cRoute::<MockStore, MockDisburser>::new()).app_data(web::Data::new(api));
    }
}

fn completed_payment_store(share: Value) -> MockStore {
    let mut store = MockStore::new();
    store
        .expect_fetch_payment()
        .returning(move |id| Ok(Some(payment(id.as_str(), PaymentStatus::Completed, order_metadata(VENDOR_PHONE, share.clone())))));
    store
}

#[actix_web::test]
async fn pays_the_vendor() {
    let _ = env_logger::try_init().ok();
    let mut store = completed_payment_store(json!(85));
    store.expect_claim_payout().times(1).returning(|p| Ok(claimed(p)));
    store.expect_complete_payout().times(1).returning(|id, state| Ok(completed("pay_1", id, state)));
    store.expect_fail_payout().never();
    let mut disburser = MockDisburser::new();
    disburser
        .expect_disburse()
        .times(1)
        .withf(|req| req.phone == "861234567" && req.amount.value() == 8_500)
        .returning(|_| Ok(DisbursementResponse::success(Some("TX-1".into()))));

    let (status, body) =
        post_request(Auth::valid(), PATH, json!({"paymentId": "pay_1"}), configure_with(store, disburser)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    assert_eq!(data["transactionId"], json!("TX-1"));
    assert_eq!(data["status"], json!("completed"));
    assert_eq!(data["totalAmount"], json!(100.0));
    assert_eq!(data["vendorAmount"], json!(85.0));
    assert_eq!(data["systemCommission"], json!(15.0));
    assert_eq!(data["systemCommissionAmount"], json!(15.0));
    assert_eq!(data["vendorShare"], json!(85.0));
    assert!(data["reference"].as_str().unwrap().len() <= 27);
}

#[actix_web::test]
async fn commission_override_as_string() {
    let _ = env_logger::try_init().ok();
    let mut store = completed_payment_store(json!("85"));
    store.expect_claim_payout().returning(|p| Ok(claimed(p)));
    store.expect_complete_payout().returning(|id, state| Ok(completed("pay_1", id, state)));
    let mut disburser = MockDisburser::new();
    disburser.expect_disburse().returning(|_| Ok(DisbursementResponse::success(Some("TX-2".into()))));

    let body = json!({"paymentId": "pay_1", "commissionPercentage": "20"});
    let (status, body) = post_request(Auth::valid(), PATH, body, configure_with(store, disburser)).await;
    assert_eq!(status, StatusCode::OK);
    // The stored vendor share still decides the vendor amount
    assert_eq!(body["data"]["systemCommission"], json!(20.0));
    assert_eq!(body["data"]["systemCommissionAmount"], json!(20.0));
    assert_eq!(body["data"]["vendorAmount"], json!(85.0));
}

#[actix_web::test]
async fn api_key_is_required() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().never();
    let mut disburser = MockDisburser::new();
    disburser.expect_disburse().never();
    let (status, body) =
        post_request(Auth::None, PATH, json!({"paymentId": "pay_1"}), configure_with(store, disburser)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("A valid API key is required. No API key was provided."));
}

#[actix_web::test]
async fn wrong_api_key_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(
        Auth::Header("not-the-key"),
        PATH,
        json!({"paymentId": "pay_1"}),
        configure_with(MockStore::new(), MockDisburser::new()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("A valid API key is required. The API key is invalid."));
}

#[actix_web::test]
async fn api_key_header_is_accepted() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|_| Ok(None));
    let (status, _) = post_request(
        Auth::Header("test-api-key"),
        PATH,
        json!({"paymentId": "pay_1"}),
        configure_with(store, MockDisburser::new()),
    )
    .await;
    // Past the key check, into the payout flow
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|_| Ok(None));
    store.expect_claim_payout().never();
    let (status, body) =
        post_request(Auth::valid(), PATH, json!({"paymentId": "nope"}), configure_with(store, MockDisburser::new()))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "Payment nope does not exist"}));
}

#[actix_web::test]
async fn pending_payment_is_refused() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_payment()
        .returning(|id| Ok(Some(payment(id.as_str(), PaymentStatus::Pending, order_metadata(VENDOR_PHONE, json!(85))))));
    store.expect_claim_payout().never();
    let mut disburser = MockDisburser::new();
    disburser.expect_disburse().never();
    let (status, body) =
        post_request(Auth::valid(), PATH, json!({"paymentId": "pay_1"}), configure_with(store, disburser)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        json!("Payment pay_1 is pending. Vendors can only be paid for completed or approved payments")
    );
}

#[actix_web::test]
async fn phone_outside_accepted_prefixes() {
    let _ = env_logger::try_init().ok();
    let mut store = completed_payment_store(json!(85));
    store.expect_claim_payout().never();
    let body = json!({"paymentId": "pay_1", "vendorPhone": "+258821234567"});
    let (status, body) = post_request(Auth::valid(), PATH, body, configure_with(store, MockDisburser::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid vendor phone number."));
}

#[actix_web::test]
async fn failed_disbursement_is_reported() {
    let _ = env_logger::try_init().ok();
    let mut store = completed_payment_store(json!(85));
    store.expect_claim_payout().times(1).returning(|p| Ok(claimed(p)));
    store.expect_complete_payout().never();
    store
        .expect_fail_payout()
        .times(1)
        .withf(|_, state| state.error == "Insufficient float")
        .returning(|id, state| Ok(failed("pay_1", id, state)));
    let mut disburser = MockDisburser::new();
    disburser.expect_disburse().returning(|_| Ok(DisbursementResponse::failure("Insufficient float")));

    let (status, body) =
        post_request(Auth::valid(), PATH, json!({"paymentId": "pay_1"}), configure_with(store, disburser)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("B2C disbursement failed. Insufficient float"));
    assert_eq!(body["data"], json!({"status": "failed", "error": "Insufficient float"}));
}

#[actix_web::test]
async fn rail_errors_are_reported() {
    let _ = env_logger::try_init().ok();
    let mut store = completed_payment_store(json!(85));
    store.expect_claim_payout().returning(|p| Ok(claimed(p)));
    store.expect_fail_payout().times(1).returning(|id, state| Ok(failed("pay_1", id, state)));
    let mut disburser = MockDisburser::new();
    disburser.expect_disburse().returning(|_| Err(DisbursementError("connection refused".into())));

    let (status, body) =
        post_request(Auth::valid(), PATH, json!({"paymentId": "pay_1"}), configure_with(store, disburser)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["data"]["error"], json!("connection refused"));
}

#[actix_web::test]
async fn malformed_request_body() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().never();
    let (status, body) = post_request(
        Auth::valid(),
        PATH,
        json!({"commissionPercentage": 10}),
        configure_with(store, MockDisburser::new()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("paymentId"));
}

#[actix_web::test]
async fn payment_ids_are_passed_through() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_payment()
        .withf(|id: &PaymentId| id.as_str() == "order-2024-0042")
        .times(1)
        .returning(|_| Ok(None));
    let (status, _) = post_request(
        Auth::valid(),
        PATH,
        json!({"paymentId": "order-2024-0042"}),
        configure_with(store, MockDisburser::new()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
