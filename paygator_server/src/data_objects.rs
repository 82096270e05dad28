use std::fmt::Display;

use paygator_common::Amount;
use paygator_engine::{
    db_types::{NewPayment, PaymentId, PaymentMetadata, PaymentStatus, PayoutStatus},
    payment_objects::{PaymentQueryFilter, PayoutQueryFilter},
    PayoutOptions,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The envelope that wraps every JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T = Value> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string(), data: None }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string(), data: None }
    }
}

impl<T> JsonResponse<T> {
    pub fn with_data<S: Display>(message: S, data: T) -> Self {
        Self { success: true, message: message.to_string(), data: Some(data) }
    }
}

//-------------------------------------------    Vendor payouts    -----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayoutRequest {
    pub payment_id: PaymentId,
    /// Storefronts send this as either a number or a numeric string
    #[serde(default, deserialize_with = "number_or_string")]
    pub commission_percentage: Option<String>,
    #[serde(default)]
    pub vendor_phone: Option<String>,
}

impl ProcessPayoutRequest {
    pub fn options(&self) -> PayoutOptions {
        PayoutOptions {
            commission_percentage: self.commission_percentage.clone(),
            vendor_phone: self.vendor_phone.clone().filter(|p| !p.trim().is_empty()),
        }
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v) => Err(de::Error::custom(format!("expected a number or a numeric string, not {v}"))),
    }
}

//-------------------------------------------       Payments       -----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentRequest {
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    pub amount: Amount,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub metadata: PaymentMetadata,
}

impl NewPaymentRequest {
    /// Converts the request into a new payment, generating a payment id if the caller did not supply one.
    pub fn into_new_payment(self) -> NewPayment {
        let payment_id = self.payment_id.filter(|id| !id.as_str().trim().is_empty()).unwrap_or_else(new_payment_id);
        let mut payment = NewPayment::new(payment_id, self.amount).with_metadata(self.metadata);
        if let Some(currency) = self.currency {
            payment = payment.with_currency(currency.to_uppercase());
        }
        if let Some(vendor_id) = self.vendor_id {
            payment = payment.with_vendor_id(vendor_id);
        }
        payment
    }
}

pub fn new_payment_id() -> PaymentId {
    let suffix: String = thread_rng().sample_iter(&Alphanumeric).take(16).map(char::from).collect();
    PaymentId::new(format!("pay_{suffix}"))
}

/// A status update sent by a payment rail.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

//-------------------------------------------         Admin        -----------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSearchParams {
    pub status: Option<PaymentStatus>,
    pub vendor_id: Option<String>,
}

impl From<PaymentSearchParams> for PaymentQueryFilter {
    fn from(params: PaymentSearchParams) -> Self {
        let mut query = PaymentQueryFilter::default();
        if let Some(status) = params.status {
            query = query.with_status(status);
        }
        if let Some(vendor_id) = params.vendor_id {
            query = query.with_vendor_id(vendor_id);
        }
        query
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSearchParams {
    pub status: Option<PayoutStatus>,
    pub vendor_id: Option<String>,
}

impl From<PayoutSearchParams> for PayoutQueryFilter {
    fn from(params: PayoutSearchParams) -> Self {
        let mut query = PayoutQueryFilter::default();
        if let Some(status) = params.status {
            query = query.with_status(status);
        }
        if let Some(vendor_id) = params.vendor_id {
            query = query.with_vendor_id(vendor_id);
        }
        query
    }
}

pub const DEFAULT_AUDIT_LOG_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogParams {
    pub limit: Option<i64>,
}
