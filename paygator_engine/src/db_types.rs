use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::*;
pub use paygator_common::{Amount, Percentage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------       PaymentId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PaymentId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Payment ids cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for PaymentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PaymentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The payment has been created, but the customer has not paid yet.
    Pending,
    /// The rail has accepted the payment request and is waiting on the customer.
    Processing,
    /// Funds have been received from the customer.
    Completed,
    /// Funds have been received and the payment was approved by an operator.
    Approved,
    /// The customer payment failed or was declined.
    Failed,
}

impl PaymentStatus {
    /// Vendor payouts may only be made for payments with one of these statuses.
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::Completed | Self::Approved)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_payable()
    }

    pub fn can_transition_to(&self, new_status: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, new_status),
            (Pending, Processing | Completed | Approved | Failed) |
                (Processing, Completed | Approved | Failed) |
                (Failed, Processing)
        )
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Processing => write!(f, "processing"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Approved => write!(f, "approved"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "approved" => Ok(Self::Approved),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------      PayoutStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Processing,
    Completed,
    Failed,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Processing => write!(f, "processing"),
            PayoutStatus::Completed => write!(f, "completed"),
            PayoutStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payout status: {s}"))),
        }
    }
}

impl TryFrom<String> for PayoutStatus {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------      PayoutSplit      ---------------------------------------------------------
/// How a payment total is divided between the vendor and the platform.
///
/// `system_commission` and `vendor_share` are percentages; the `*_amount` fields are the matching money values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSplit {
    pub total_amount: Amount,
    pub vendor_amount: Amount,
    pub system_commission: Percentage,
    pub system_commission_amount: Amount,
    pub vendor_share: Percentage,
}

//--------------------------------------      PayoutState      ---------------------------------------------------------
/// The lifecycle of the most recent vendor payout attempt, as recorded in `metadata.vendorB2CPayment`.
///
/// Decoding never fails. A record that lacks fields the engine writes (one written by another system, say) is kept
/// verbatim as `Unparsed`, and its `status` still drives the idempotency check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PayoutState {
    #[default]
    Uninitiated,
    Processing(ProcessingPayout),
    Completed(CompletedPayout),
    Failed(FailedPayout),
    Unparsed { status: Option<PayoutStatus>, record: Value },
}

/// The wire shape of a fully recorded payout state.
#[derive(Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum RecordedPayout {
    Processing(ProcessingPayout),
    Completed(CompletedPayout),
    Failed(FailedPayout),
}

impl PayoutState {
    pub fn is_uninitiated(&self) -> bool {
        matches!(self, Self::Uninitiated)
    }

    pub fn is_completed(&self) -> bool {
        self.status() == Some(PayoutStatus::Completed)
    }

    pub fn status(&self) -> Option<PayoutStatus> {
        match self {
            PayoutState::Uninitiated => None,
            PayoutState::Processing(_) => Some(PayoutStatus::Processing),
            PayoutState::Completed(_) => Some(PayoutStatus::Completed),
            PayoutState::Failed(_) => Some(PayoutStatus::Failed),
            PayoutState::Unparsed { status, .. } => *status,
        }
    }
}

impl From<Value> for PayoutState {
    fn from(value: Value) -> Self {
        if value.is_null() {
            return Self::Uninitiated;
        }
        match serde_json::from_value::<RecordedPayout>(value.clone()) {
            Ok(RecordedPayout::Processing(p)) => Self::Processing(p),
            Ok(RecordedPayout::Completed(c)) => Self::Completed(c),
            Ok(RecordedPayout::Failed(f)) => Self::Failed(f),
            Err(e) => {
                debug!("Keeping vendorB2CPayment as an unparsed record. {e}");
                let status = value.get("status").and_then(Value::as_str).and_then(|s| s.parse().ok());
                Self::Unparsed { status, record: value }
            },
        }
    }
}

impl From<PayoutState> for Value {
    fn from(state: PayoutState) -> Self {
        let recorded = match state {
            PayoutState::Uninitiated => return Value::Null,
            PayoutState::Unparsed { record, .. } => return record,
            PayoutState::Processing(p) => RecordedPayout::Processing(p),
            PayoutState::Completed(c) => RecordedPayout::Completed(c),
            PayoutState::Failed(f) => RecordedPayout::Failed(f),
        };
        serde_json::to_value(recorded).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingPayout {
    pub initiated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub split: PayoutSplit,
    pub vendor_phone: String,
    pub reference: String,
}

impl ProcessingPayout {
    pub fn complete(self, transaction_id: Option<String>, completed_at: DateTime<Utc>) -> CompletedPayout {
        CompletedPayout {
            initiated_at: self.initiated_at,
            completed_at,
            transaction_id,
            split: self.split,
            vendor_phone: self.vendor_phone,
            reference: self.reference,
        }
    }

    pub fn fail(self, error: String, failed_at: DateTime<Utc>) -> FailedPayout {
        FailedPayout {
            initiated_at: self.initiated_at,
            failed_at,
            error,
            split: self.split,
            vendor_phone: self.vendor_phone,
            reference: self.reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPayout {
    pub initiated_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(flatten)]
    pub split: PayoutSplit,
    pub vendor_phone: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPayout {
    pub initiated_at: DateTime<Utc>,
    pub failed_at: DateTime<Utc>,
    pub error: String,
    #[serde(flatten)]
    pub split: PayoutSplit,
    pub vendor_phone: String,
    pub reference: String,
}

//--------------------------------------    PaymentMetadata    ---------------------------------------------------------
/// The JSON document attached to every payment.
///
/// Only the parts the engine reads or writes are typed. Every other key, at every level, is carried in the
/// `extra` maps so that rewriting the metadata never loses information supplied by the storefront.
///
/// Decoding never fails: if the typed parts do not have the expected shape, the whole document is kept in `extra`
/// and only `vendorB2CPayment` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct PaymentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_details: Option<OrderDetails>,
    #[serde(default, rename = "vendorB2CPayment", skip_serializing_if = "PayoutState::is_uninitiated")]
    pub vendor_b2c_payment: PayoutState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c2b_transaction: Option<C2bTransaction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedMetadata {
    #[serde(default)]
    order_details: Option<OrderDetails>,
    #[serde(default, rename = "vendorB2CPayment")]
    vendor_b2c_payment: PayoutState,
    #[serde(default)]
    c2b_transaction: Option<C2bTransaction>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Key under which a metadata value that is not a JSON object is kept.
pub const RAW_METADATA_KEY: &str = "rawMetadata";

impl From<Value> for PaymentMetadata {
    fn from(value: Value) -> Self {
        let mut extra = match value {
            Value::Null => return Self::default(),
            Value::Object(map) => map,
            other => {
                warn!("Payment metadata is not a JSON object. Keeping it under '{RAW_METADATA_KEY}'");
                return Self { extra: Map::from_iter([(RAW_METADATA_KEY.to_string(), other)]), ..Self::default() };
            },
        };
        match serde_json::from_value::<TypedMetadata>(Value::Object(extra.clone())) {
            Ok(m) => Self {
                order_details: m.order_details,
                vendor_b2c_payment: m.vendor_b2c_payment,
                c2b_transaction: m.c2b_transaction,
                extra: m.extra,
            },
            Err(e) => {
                warn!("Payment metadata has an unexpected shape and is kept as-is. {e}");
                let vendor_b2c_payment = extra.remove("vendorB2CPayment").map(PayoutState::from).unwrap_or_default();
                Self { order_details: None, vendor_b2c_payment, c2b_transaction: None, extra }
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<InternalOrderDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalOrderDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_merchant: Option<VendorMerchant>,
    /// Kept as raw JSON; storefronts send this as a number or a numeric string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_share: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorMerchant {
    /// Storefronts send this as a string or a bare number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The rail's record of the customer payment, as reported by its webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct C2bTransaction {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentMetadata {
    fn internal(&self) -> Option<&InternalOrderDetails> {
        self.order_details.as_ref().and_then(|d| d.internal.as_ref())
    }

    pub fn vendor_phone(&self) -> Option<String> {
        let phone = match self.internal()?.vendor_merchant.as_ref()?.phone.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(phone).filter(|p| !p.is_empty())
    }

    /// The vendor's share of the payment as stored on the order. Returns `Ok(None)` if it was never set.
    pub fn vendor_share(&self) -> Result<Option<Percentage>, ConversionError> {
        match self.internal().and_then(|i| i.vendor_share.as_ref()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => {
                s.parse().map(Some).map_err(|e| ConversionError(format!("vendorShare '{s}' is not a number. {e}")))
            },
            Some(v @ Value::Number(_)) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| ConversionError(format!("vendorShare {v} is not a valid percentage. {e}"))),
            Some(v) => Err(ConversionError(format!("vendorShare must be a number, not {v}"))),
        }
    }
}

type MetadataJson = Json<PaymentMetadata>;

impl From<MetadataJson> for PaymentMetadata {
    fn from(value: Json<PaymentMetadata>) -> Self {
        value.0
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub payment_id: PaymentId,
    pub amount: Amount,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub vendor_id: Option<String>,
    #[sqlx(try_from = "MetadataJson")]
    pub metadata: PaymentMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewPayment      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub payment_id: PaymentId,
    /// The C2B total
    pub amount: Amount,
    pub currency: String,
    pub vendor_id: Option<String>,
    pub metadata: PaymentMetadata,
}

impl NewPayment {
    pub fn new(payment_id: PaymentId, amount: Amount) -> Self {
        Self {
            payment_id,
            amount,
            currency: paygator_common::DEFAULT_CURRENCY_CODE.to_string(),
            vendor_id: None,
            metadata: PaymentMetadata::default(),
        }
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_vendor_id<S: Into<String>>(mut self, vendor_id: S) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: PaymentMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

//--------------------------------------      VendorPayout     ---------------------------------------------------------
/// One attempt at paying a vendor their share of a payment. Rows are never deleted or reused.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayout {
    pub id: i64,
    pub payment_id: PaymentId,
    pub vendor_id: Option<String>,
    pub total_amount: Amount,
    #[sqlx(try_from = "String")]
    pub vendor_share_pct: Percentage,
    #[sqlx(try_from = "String")]
    pub system_commission_pct: Percentage,
    pub system_commission_amount: Amount,
    pub vendor_amount: Amount,
    #[sqlx(try_from = "String")]
    pub status: PayoutStatus,
    pub vendor_phone: String,
    pub reference: String,
    pub b2c_transaction_id: Option<String>,
    pub error_message: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorPayout {
    pub fn split(&self) -> PayoutSplit {
        PayoutSplit {
            total_amount: self.total_amount,
            vendor_amount: self.vendor_amount,
            system_commission: self.system_commission_pct,
            system_commission_amount: self.system_commission_amount,
            vendor_share: self.vendor_share_pct,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewVendorPayout {
    pub payment_id: PaymentId,
    pub vendor_id: Option<String>,
    pub split: PayoutSplit,
    /// Local-format number, as sent to the disbursement rail
    pub vendor_phone: String,
    pub reference: String,
    pub initiated_at: DateTime<Utc>,
}

impl NewVendorPayout {
    /// The metadata snapshot written alongside the new payout row.
    pub fn processing_state(&self) -> ProcessingPayout {
        ProcessingPayout {
            initiated_at: self.initiated_at,
            split: self.split,
            vendor_phone: self.vendor_phone.clone(),
            reference: self.reference.clone(),
        }
    }
}

//--------------------------------------       AuditLog        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PaymentCreated,
    PaymentStatusChanged,
    PayoutInitiated,
    PayoutCompleted,
    PayoutFailed,
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::PaymentCreated => "payment_created",
            AuditAction::PaymentStatusChanged => "payment_status_changed",
            AuditAction::PayoutInitiated => "payout_initiated",
            AuditAction::PayoutCompleted => "payout_completed",
            AuditAction::PayoutFailed => "payout_failed",
        };
        f.write_str(s)
    }
}

impl FromStr for AuditAction {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment_created" => Ok(Self::PaymentCreated),
            "payment_status_changed" => Ok(Self::PaymentStatusChanged),
            "payout_initiated" => Ok(Self::PayoutInitiated),
            "payout_completed" => Ok(Self::PayoutCompleted),
            "payout_failed" => Ok(Self::PayoutFailed),
            s => Err(ConversionError(format!("Invalid audit action: {s}"))),
        }
    }
}

impl TryFrom<String> for AuditAction {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    pub payment_id: Option<PaymentId>,
    #[sqlx(try_from = "String")]
    pub action: AuditAction,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
