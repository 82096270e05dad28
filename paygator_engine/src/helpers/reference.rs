use chrono::{DateTime, Utc};

/// The longest reference the M-Pesa B2C rail accepts.
pub const DEFAULT_REFERENCE_MAX_LEN: usize = 27;

const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S%3f";

/// Builds the disbursement reference for a payout attempt.
///
/// The reference is the alphanumeric characters of the payment id followed by a millisecond timestamp. When the result
/// is too long, the payment id is shortened so that repeat attempts for the same payment still get distinct
/// references.
pub fn generate_reference(payment_id: &str, now: DateTime<Utc>, max_len: usize) -> String {
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    let id = payment_id.chars().filter(char::is_ascii_alphanumeric).collect::<String>();
    let id_len = max_len.saturating_sub(stamp.len()).min(id.len());
    let mut reference = format!("{}{stamp}", &id[..id_len]);
    reference.truncate(max_len);
    reference
}
