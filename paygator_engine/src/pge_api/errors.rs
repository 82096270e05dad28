use thiserror::Error;

use crate::{
    db_types::{PaymentId, PaymentStatus},
    helpers::PhoneRulesError,
    traits::StoreError,
};

/// Why a vendor payout could not be made.
///
/// Every variant except [`PayoutError::DisbursementFailed`] and [`PayoutError::DatabaseError`] is raised before
/// anything is written.
#[derive(Debug, Clone, Error)]
pub enum PayoutError {
    #[error("Payment {0} does not exist")]
    NotFound(PaymentId),
    #[error("Payment {payment_id} is {status}. Vendors can only be paid for completed or approved payments")]
    InvalidState { payment_id: PaymentId, status: PaymentStatus },
    #[error("The vendor for payment {0} has already been paid")]
    AlreadyPaid(PaymentId),
    #[error("A vendor payout for payment {0} is already in progress")]
    PayoutInProgress(PaymentId),
    #[error("Invalid payout request. {0}")]
    InvalidInput(String),
    #[error("No vendor phone number is available for payment {0}")]
    MissingPhone(PaymentId),
    #[error("Invalid vendor phone number. {0}")]
    InvalidPhoneFormat(String),
    #[error("B2C disbursement failed. {0}")]
    DisbursementFailed(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl PayoutError {
    /// A short machine-friendly code, reported for each failed payment in a batch distribution.
    pub fn code(&self) -> &'static str {
        match self {
            PayoutError::NotFound(_) => "not_found",
            PayoutError::InvalidState { .. } => "invalid_state",
            PayoutError::AlreadyPaid(_) => "already_paid",
            PayoutError::PayoutInProgress(_) => "payout_in_progress",
            PayoutError::InvalidInput(_) => "invalid_input",
            PayoutError::MissingPhone(_) => "missing_phone",
            PayoutError::InvalidPhoneFormat(_) => "invalid_phone_format",
            PayoutError::DisbursementFailed(_) => "disbursement_failed",
            PayoutError::DatabaseError(_) => "database_error",
        }
    }
}

impl From<StoreError> for PayoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PaymentNotFound(id) => PayoutError::NotFound(id),
            StoreError::PayoutInProgress(id) => PayoutError::PayoutInProgress(id),
            StoreError::PayoutAlreadyCompleted(id) => PayoutError::AlreadyPaid(id),
            e => PayoutError::DatabaseError(e.to_string()),
        }
    }
}

impl From<PhoneRulesError> for PayoutError {
    fn from(e: PhoneRulesError) -> Self {
        match e {
            PhoneRulesError::InvalidPhoneFormat(phone) => {
                PayoutError::InvalidPhoneFormat(format!("{phone} is not an accepted local mobile number"))
            },
            e => PayoutError::InvalidInput(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Payment {0} already exists")]
    PaymentAlreadyExists(PaymentId),
    #[error("Payment {0} does not exist")]
    NotFound(PaymentId),
    #[error("Payment {payment_id} cannot move from {from} to {to}")]
    InvalidTransition { payment_id: PaymentId, from: PaymentStatus, to: PaymentStatus },
    #[error("The payment was modified by another request. {0}")]
    StatusConflict(String),
    #[error("Invalid payment request. {0}")]
    InvalidInput(String),
}

impl From<StoreError> for PaymentApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PaymentAlreadyExists(id) => PaymentApiError::PaymentAlreadyExists(id),
            StoreError::PaymentNotFound(id) => PaymentApiError::NotFound(id),
            e @ StoreError::PaymentStatusChanged { .. } => PaymentApiError::StatusConflict(e.to_string()),
            e => PaymentApiError::DatabaseError(e.to_string()),
        }
    }
}
