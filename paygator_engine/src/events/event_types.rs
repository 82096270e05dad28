use serde::{Deserialize, Serialize};

use crate::db_types::VendorPayout;

/// A vendor has been paid. `payout` is the finalized payout row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutCompletedEvent {
    pub payout: VendorPayout,
}

impl PayoutCompletedEvent {
    pub fn new(payout: VendorPayout) -> Self {
        Self { payout }
    }
}

/// A payout attempt has failed and been recorded as such. The payment is eligible for another attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutFailedEvent {
    pub payout: VendorPayout,
    pub error: String,
}

impl PayoutFailedEvent {
    pub fn new(payout: VendorPayout, error: String) -> Self {
        Self { payout, error }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    PayoutCompleted(PayoutCompletedEvent),
    PayoutFailed(PayoutFailedEvent),
}
