use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{PaymentId, PayoutSplit, PayoutStatus, VendorPayout},
    helpers::{PhoneRules, PhoneRulesError, DEFAULT_REFERENCE_MAX_LEN},
    pge_api::errors::PayoutError,
};

pub const DEFAULT_DISBURSEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the payout flow.
#[derive(Debug, Clone)]
pub struct PayoutConfig {
    pub phone_rules: PhoneRules,
    pub reference_max_len: usize,
    /// How long to wait for the rail to answer before recording the attempt as failed
    pub disbursement_timeout: Duration,
}

impl PayoutConfig {
    pub fn new(phone_rules: PhoneRules) -> Self {
        Self { phone_rules, reference_max_len: DEFAULT_REFERENCE_MAX_LEN, disbursement_timeout: DEFAULT_DISBURSEMENT_TIMEOUT }
    }

    pub fn try_default() -> Result<Self, PhoneRulesError> {
        Ok(Self::new(PhoneRules::try_default()?))
    }

    pub fn with_reference_max_len(mut self, max_len: usize) -> Self {
        self.reference_max_len = max_len;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.disbursement_timeout = timeout;
        self
    }
}

/// Caller overrides for a single payout.
#[derive(Debug, Clone, Default)]
pub struct PayoutOptions {
    /// Replaces the platform commission percentage. See [`crate::compute_split`].
    pub commission_percentage: Option<String>,
    /// Used instead of the vendor phone number stored on the order
    pub vendor_phone: Option<String>,
}

impl PayoutOptions {
    pub fn with_commission<S: Into<String>>(mut self, pct: S) -> Self {
        self.commission_percentage = Some(pct.into());
        self
    }

    pub fn with_vendor_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.vendor_phone = Some(phone.into());
        self
    }
}

/// The outcome of a successful payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutReceipt {
    pub payout_id: i64,
    pub payment_id: PaymentId,
    pub transaction_id: Option<String>,
    pub status: PayoutStatus,
    pub reference: String,
    pub vendor_phone: String,
    #[serde(flatten)]
    pub split: PayoutSplit,
}

impl From<VendorPayout> for PayoutReceipt {
    fn from(payout: VendorPayout) -> Self {
        let split = payout.split();
        Self {
            payout_id: payout.id,
            payment_id: payout.payment_id,
            transaction_id: payout.b2c_transaction_id,
            status: payout.status,
            reference: payout.reference,
            vendor_phone: payout.vendor_phone,
            split,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResult {
    pub payment_id: PaymentId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub total: usize,
    pub distributed: usize,
    pub failed: usize,
    pub results: Vec<DistributionResult>,
}

impl DistributionSummary {
    pub fn record_success(&mut self, payment_id: PaymentId, transaction_id: Option<String>) {
        self.total += 1;
        self.distributed += 1;
        self.results.push(DistributionResult {
            payment_id,
            success: true,
            transaction_id,
            error: None,
            error_code: None,
        });
    }

    pub fn record_failure(&mut self, payment_id: PaymentId, error: &PayoutError) {
        self.total += 1;
        self.failed += 1;
        self.results.push(DistributionResult {
            payment_id,
            success: false,
            transaction_id: None,
            error: Some(error.to_string()),
            error_code: Some(error.code().to_string()),
        });
    }
}
