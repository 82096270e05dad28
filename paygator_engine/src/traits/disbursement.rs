use paygator_common::Amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementRequest {
    /// Local-format mobile number, without the country code
    pub phone: String,
    pub amount: Amount,
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbursementResponse {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl DisbursementResponse {
    pub fn success(transaction_id: Option<String>) -> Self {
        Self { success: true, transaction_id, ..Default::default() }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: Some(message.into()), ..Default::default() }
    }
}

/// The disbursement could not be attempted, or its outcome is unknown.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DisbursementError(pub String);

/// Sends a vendor's share of a payment to their mobile wallet.
///
/// Implementations should not retry on their own. Both an `Err` and a response with `success: false` are recorded
/// as a failed payout by the caller.
#[allow(async_fn_in_trait)]
pub trait B2cDisbursement {
    async fn disburse(&self, request: DisbursementRequest) -> Result<DisbursementResponse, DisbursementError>;
}
