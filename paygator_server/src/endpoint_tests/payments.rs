use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use paygator_engine::{
    db_types::{C2bTransaction, Payment, PaymentId, PaymentStatus},
    traits::StoreError,
    PaymentApi,
};
use serde_json::json;

use super::{
    helpers::{get_request, order_metadata, payment, post_request, Auth, VENDOR_PHONE},
    mocks::MockStore,
};
use crate::{
    config::ProxyConfig,
    routes::{CreatePaymentRoute, PaymentByIdRoute, PaymentWebhookRoute},
};

fn configure_with(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = PaymentApi::new(store);
        cfg.service(CreatePaymentRoute::<MockStore>::new())
            .service(PaymentByIdRoute::<MockStore>::new())
            .service(PaymentWebhookRoute::<MockStore>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(ProxyConfig::default()));
    }
}

fn with_status(mut payment: Payment, status: PaymentStatus, c2b: Option<C2bTransaction>) -> Payment {
    payment.status = status;
    payment.metadata.c2b_transaction = c2b;
    payment.updated_at = Utc::now();
    payment
}

#[actix_web::test]
async fn create_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_insert_payment()
        .times(1)
        .withf(|p| p.payment_id.as_str() == "pay_100" && p.amount.value() == 10_000 && p.currency == "MZN")
        .returning(|p| {
            let mut row = payment(p.payment_id.as_str(), PaymentStatus::Pending, json!({}));
            row.metadata = p.metadata;
            Ok(row)
        });
    let body = json!({
        "paymentId": "pay_100",
        "amount": 100,
        "metadata": order_metadata(VENDOR_PHONE, json!("85"))
    });
    let (status, body) = post_request(Auth::None, "/payments", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["paymentId"], json!("pay_100"));
    assert_eq!(body["data"]["status"], json!("pending"));
    assert_eq!(body["data"]["metadata"]["orderDetails"]["internal"]["vendorShare"], json!("85"));
}

#[actix_web::test]
async fn payment_id_is_generated_when_absent() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_insert_payment()
        .withf(|p| p.payment_id.as_str().starts_with("pay_"))
        .returning(|p| Ok(payment(p.payment_id.as_str(), PaymentStatus::Pending, json!({}))));
    let (status, body) = post_request(Auth::None, "/payments", json!({"amount": "250.50"}), configure_with(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["paymentId"].as_str().unwrap().starts_with("pay_"));
}

#[actix_web::test]
async fn duplicate_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_payment().returning(|p| Err(StoreError::PaymentAlreadyExists(p.payment_id)));
    let body = json!({"paymentId": "pay_1", "amount": 100});
    let (status, body) = post_request(Auth::None, "/payments", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"success": false, "message": "Payment pay_1 already exists"}));
}

#[actix_web::test]
async fn zero_amount_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_payment().never();
    let (status, body) =
        post_request(Auth::None, "/payments", json!({"paymentId": "pay_1", "amount": 0}), configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn fetch_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|id| match id.as_str() {
        "pay_1" => Ok(Some(payment("pay_1", PaymentStatus::Completed, json!({"channel": "web"})))),
        _ => Ok(None),
    });
    let (status, body) = get_request(Auth::None, "/payments/pay_1", configure_with(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("completed"));
    assert_eq!(body["data"]["amount"], json!(100.0));
    assert_eq!(body["data"]["metadata"]["channel"], json!("web"));
}

#[actix_web::test]
async fn fetch_unknown_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|_| Ok(None));
    let (status, body) = get_request(Auth::None, "/payments/pay_404", configure_with(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Payment pay_404 does not exist"));
}

#[actix_web::test]
async fn webhook_completes_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|id| Ok(Some(payment(id.as_str(), PaymentStatus::Processing, json!({})))));
    store
        .expect_update_payment_status()
        .times(1)
        .withf(|id: &PaymentId, from, to, c2b| {
            id.as_str() == "pay_1" &&
                *from == PaymentStatus::Processing &&
                *to == PaymentStatus::Completed &&
                c2b.as_ref().is_some_and(|t| t.provider == "mpesa" && t.transaction_id.as_deref() == Some("MP-77"))
        })
        .returning(|id, _, to, c2b| Ok(with_status(payment(id.as_str(), PaymentStatus::Processing, json!({})), to, c2b)));
    let body = json!({"paymentId": "pay_1", "status": "completed", "transactionId": "MP-77"});
    let (status, body) = post_request(Auth::None, "/webhooks/mpesa", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Payment status updated"));
    assert_eq!(body["data"]["status"], json!("completed"));
    assert_eq!(body["data"]["metadata"]["c2bTransaction"]["transactionId"], json!("MP-77"));
}

#[actix_web::test]
async fn repeated_webhook_is_a_no_op() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|id| Ok(Some(payment(id.as_str(), PaymentStatus::Completed, json!({})))));
    store.expect_update_payment_status().never();
    let body = json!({"paymentId": "pay_1", "status": "completed"});
    let (status, body) = post_request(Auth::None, "/webhooks/emola", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Payment status unchanged"));
}

#[actix_web::test]
async fn completed_payments_cannot_fail() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|id| Ok(Some(payment(id.as_str(), PaymentStatus::Completed, json!({})))));
    store.expect_update_payment_status().never();
    let body = json!({"paymentId": "pay_1", "status": "failed"});
    let (status, body) = post_request(Auth::None, "/webhooks/mpesa", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Payment pay_1 cannot move from completed to failed"));
}

#[actix_web::test]
async fn concurrent_status_change() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().returning(|id| Ok(Some(payment(id.as_str(), PaymentStatus::Pending, json!({})))));
    store.expect_update_payment_status().returning(|id, from, _, _| {
        Err(StoreError::PaymentStatusChanged {
            payment_id: id.clone(),
            expected: from,
            actual: PaymentStatus::Failed,
        })
    });
    let body = json!({"paymentId": "pay_1", "status": "processing"});
    let (status, _) = post_request(Auth::None, "/webhooks/mpesa", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn unknown_status_in_webhook() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_payment().never();
    let body = json!({"paymentId": "pay_1", "status": "refunded"});
    let (status, body) = post_request(Auth::None, "/webhooks/mpesa", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn numeric_phone_and_odd_metadata_are_accepted() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_insert_payment()
        .times(1)
        .withf(|p| p.metadata.vendor_phone().as_deref() == Some("258861234567") && p.metadata.extra["tags"] == json!(7))
        .returning(|p| {
            let mut row = payment(p.payment_id.as_str(), PaymentStatus::Pending, json!({}));
            row.metadata = p.metadata;
            Ok(row)
        });
    let body = json!({
        "paymentId": "pay_101",
        "amount": 100,
        "metadata": {
            "orderDetails": { "internal": { "vendorMerchant": { "phone": 258861234567u64 }, "vendorShare": 85 } },
            "tags": 7
        }
    });
    let (status, body) = post_request(Auth::None, "/payments", body, configure_with(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["metadata"]["orderDetails"]["internal"]["vendorMerchant"]["phone"], json!(258861234567u64));
}
