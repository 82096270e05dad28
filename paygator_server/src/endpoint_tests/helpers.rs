use actix_web::{
    body::{to_bytes, MessageBody},
    dev::ServiceResponse,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use paygator_common::{Amount, Secret};
use paygator_engine::db_types::{
    CompletedPayout,
    FailedPayout,
    NewVendorPayout,
    Payment,
    PaymentId,
    PaymentMetadata,
    PaymentStatus,
    PayoutSplit,
    PayoutStatus,
    VendorPayout,
};
use serde_json::{json, Value};

use crate::{
    middleware::ApiKey,
    server::{json_config, path_config, query_config},
};

pub const TEST_API_KEY: &str = "test-api-key";
pub const VENDOR_PHONE: &str = "+258861234567";

/// The headers a request should carry.
#[derive(Clone, Copy)]
pub enum Auth {
    None,
    Bearer(&'static str),
    Header(&'static str),
}

impl Auth {
    pub fn valid() -> Self {
        Auth::Bearer(TEST_API_KEY)
    }

    fn apply(self, req: TestRequest) -> TestRequest {
        match self {
            Auth::None => req,
            Auth::Bearer(key) => req.insert_header(("Authorization", format!("Bearer {key}"))),
            Auth::Header(key) => req.insert_header(("X-Api-Key", key)),
        }
    }
}

pub async fn get_request<F>(auth: Auth, path: &str, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    let req = auth.apply(TestRequest::get().uri(path));
    send(req, configure).await
}

pub async fn post_request<F>(auth: Auth, path: &str, body: Value, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    let req = auth.apply(TestRequest::post().uri(path).set_json(body));
    send(req, configure).await
}

async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .app_data(web::Data::new(ApiKey::new(Secret::new(TEST_API_KEY.to_string()))))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    // Errors raised by middleware come back as `Err` from the test service instead of being rendered
    let (status, bytes) = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => read_response(res).await,
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            (status, to_bytes(res.into_body()).await.unwrap().to_vec())
        },
    };
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, body)
}

async fn read_response<B: MessageBody>(res: ServiceResponse<B>) -> (StatusCode, Vec<u8>) {
    let status = res.status();
    let bytes = test::read_body(res).await;
    (status, bytes.to_vec())
}

pub fn payment(id: &str, status: PaymentStatus, metadata: Value) -> Payment {
    let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let metadata: PaymentMetadata = serde_json::from_value(metadata).unwrap();
    Payment {
        id: 1,
        payment_id: PaymentId::new(id),
        amount: Amount::from_major(100),
        currency: "MZN".to_string(),
        status,
        vendor_id: Some("vendor-7".to_string()),
        metadata,
        created_at,
        updated_at: created_at,
    }
}

pub fn order_metadata(phone: &str, vendor_share: Value) -> Value {
    json!({
        "orderDetails": {
            "internal": {
                "vendorMerchant": { "phone": phone },
                "vendorShare": vendor_share
            }
        }
    })
}

/// The row that a store would return after claiming `payout`.
pub fn claimed(payout: NewVendorPayout) -> VendorPayout {
    payout_row(&payout.payment_id, payout.split, payout.vendor_phone, payout.reference, PayoutStatus::Processing)
}

pub fn completed(payment_id: &str, payout_id: i64, state: CompletedPayout) -> VendorPayout {
    let mut row = payout_row(
        &PaymentId::new(payment_id),
        state.split,
        state.vendor_phone,
        state.reference,
        PayoutStatus::Completed,
    );
    row.id = payout_id;
    row.b2c_transaction_id = state.transaction_id;
    row.paid_at = Some(state.completed_at);
    row
}

pub fn failed(payment_id: &str, payout_id: i64, state: FailedPayout) -> VendorPayout {
    let mut row =
        payout_row(&PaymentId::new(payment_id), state.split, state.vendor_phone, state.reference, PayoutStatus::Failed);
    row.id = payout_id;
    row.error_message = Some(state.error);
    row
}

fn payout_row(
    payment_id: &PaymentId,
    split: PayoutSplit,
    vendor_phone: String,
    reference: String,
    status: PayoutStatus,
) -> VendorPayout {
    let now = Utc::now();
    VendorPayout {
        id: 1,
        payment_id: payment_id.clone(),
        vendor_id: Some("vendor-7".to_string()),
        total_amount: split.total_amount,
        vendor_share_pct: split.vendor_share,
        system_commission_pct: split.system_commission,
        system_commission_amount: split.system_commission_amount,
        vendor_amount: split.vendor_amount,
        status,
        vendor_phone,
        reference,
        b2c_transaction_id: None,
        error_message: None,
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}
