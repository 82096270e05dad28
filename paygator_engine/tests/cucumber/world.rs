use std::fmt::Debug;

use cucumber::World;
use log::*;
use paygator_engine::{
    events::EventProducers,
    test_utils::{
        fake_disburser::FakeDisburser,
        prepare_env::{prepare_test_env, random_db_path},
    },
    PaymentApi,
    PayoutConfig,
    PayoutError,
    PayoutFlowApi,
    PayoutReceipt,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct PayoutWorld {
    pub system: Option<PayoutSystem>,
    pub last_payout: Option<Result<PayoutReceipt, PayoutError>>,
}

pub struct PayoutSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub payments: PaymentApi<SqliteDatabase>,
    pub payouts: PayoutFlowApi<SqliteDatabase, FakeDisburser>,
    pub rail: FakeDisburser,
}

impl Debug for PayoutSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutSystem ({})", self.db_path)
    }
}

impl PayoutWorld {
    pub fn system(&self) -> &PayoutSystem {
        self.system.as_ref().expect("Payout system not initialised")
    }
}

impl PayoutSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let rail = FakeDisburser::new();
        let config = PayoutConfig::try_default().expect("Invalid default payout config");
        let payments = PaymentApi::new(db.clone());
        let payouts = PayoutFlowApi::new(db.clone(), rail.clone(), config, EventProducers::default());
        Self { db_path: url, db, payments, payouts, rail }
    }
}
