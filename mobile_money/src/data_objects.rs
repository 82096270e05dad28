use chrono::{DateTime, Duration, Utc};
use paygator_common::Amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tokens are refreshed this long before the aggregator says they expire.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
/// Used when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Keys under which the rails we have seen report their transaction id, in order of preference.
const TRANSACTION_ID_KEYS: [&str; 5] =
    ["transaction_id", "transactionId", "output_TransactionID", "conversation_id", "output_ConversationID"];

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let lifetime = response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Self { token: response.access_token, expires_at: now + Duration::seconds(lifetime) }
    }

    /// True while the token can still be used at `now`, allowing for a safety margin.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct B2cPaymentRequest {
    /// Local-format mobile number, without the country code.
    pub phone: String,
    pub amount: Amount,
    pub reference: String,
}

impl B2cPaymentRequest {
    pub fn new(phone: String, amount: Amount, reference: String) -> Self {
        Self { phone, amount, reference }
    }

    /// The form fields posted to the aggregator.
    pub fn form_fields(&self, client_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("client_id", client_id.to_string()),
            ("phone", self.phone.clone()),
            ("amount", self.amount.to_string()),
            ("reference", self.reference.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct B2cPaymentResponse {
    pub success: bool,
    pub status: u16,
    pub transaction_id: Option<String>,
    pub message: Option<String>,
    /// The raw response body, as JSON if the aggregator sent JSON, else as a string.
    pub data: Value,
}

impl B2cPaymentResponse {
    pub fn from_body(status: u16, body: &str) -> Self {
        let data = serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_string()));
        let http_ok = (200..300).contains(&status);
        let explicit_failure = data.get("success").and_then(Value::as_bool) == Some(false);
        let transaction_id = TRANSACTION_ID_KEYS
            .iter()
            .find_map(|k| data.get(*k).and_then(scalar_to_string))
            .filter(|s| !s.is_empty());
        let message = data
            .get("message")
            .or_else(|| data.get("error"))
            .and_then(scalar_to_string)
            .or_else(|| data.as_str().filter(|s| !s.is_empty()).map(String::from));
        Self { success: http_ok && !explicit_failure, status, transaction_id, message, data }
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
