#![allow(dead_code)]
use log::*;
use paygator_common::Amount;
use paygator_engine::{
    db_types::{NewPayment, Payment, PaymentId, PaymentMetadata, PaymentStatus},
    events::EventProducers,
    test_utils::{
        fake_disburser::FakeDisburser,
        prepare_env::{drop_database, prepare_test_env, random_db_path},
    },
    PaygatorDatabase,
    PaymentApi,
    PayoutConfig,
    PayoutFlowApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

pub const VENDOR_PHONE: &str = "+258841234567";
pub const GOOD_PHONE: &str = "+258861234567";

pub struct TestSystem {
    pub db: SqliteDatabase,
    pub payments: PaymentApi<SqliteDatabase>,
    pub payouts: PayoutFlowApi<SqliteDatabase, FakeDisburser>,
    pub rail: FakeDisburser,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_config(PayoutConfig::try_default().unwrap(), EventProducers::default()).await
    }

    pub async fn with_config(config: PayoutConfig, producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let rail = FakeDisburser::new();
        let payments = PaymentApi::new(db.clone());
        let payouts = PayoutFlowApi::new(db.clone(), rail.clone(), config, producers);
        Self { db, payments, payouts, rail }
    }

    /// Creates a payment and moves it to `status`.
    pub async fn payment(&self, id: &str, amount: i64, metadata: Value, status: PaymentStatus) -> Payment {
        let metadata: PaymentMetadata = serde_json::from_value(metadata).expect("Invalid metadata");
        let payment = NewPayment::new(PaymentId::from(id), Amount::from_major(amount)).with_metadata(metadata);
        let payment = self.payments.create_payment(payment).await.expect("Error creating payment");
        if status == PaymentStatus::Pending {
            return payment;
        }
        self.payments
            .update_status(&payment.payment_id, status, "test", Some(format!("c2b-{id}")))
            .await
            .expect("Error updating payment status")
            .payment
    }

    /// Writes a payment row directly, bypassing the typed metadata, the way another system sharing the database might.
    pub async fn raw_payment(&self, id: &str, amount: i64, status: PaymentStatus, metadata: Value) {
        sqlx::query("INSERT INTO payments (payment_id, amount, status, metadata) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(Amount::from_major(amount).value())
            .bind(status.to_string())
            .bind(metadata.to_string())
            .execute(self.db.pool())
            .await
            .expect("Error inserting raw payment");
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop_database(&url).await;
    }
}

pub fn order_metadata(phone: &str, share: Value) -> Value {
    json!({
        "orderDetails": {
            "internal": {
                "vendorMerchant": { "phone": phone, "name": "Loja da Ana" },
                "vendorShare": share
            },
            "items": [{ "sku": "cap-01", "qty": 2 }]
        },
        "channel": "web"
    })
}
