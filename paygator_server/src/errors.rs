use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use paygator_engine::{PaymentApiError, PayoutError, StoreError};
use serde_json::json;
use thiserror::Error;

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("A valid API key is required. {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Payout(#[from] PayoutError),
    #[error("{0}")]
    Payment(#[from] PaymentApiError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Payout(e) => match e {
                PayoutError::NotFound(_) => StatusCode::NOT_FOUND,
                PayoutError::DisbursementFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PayoutError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PayoutError::InvalidState { .. } |
                PayoutError::AlreadyPaid(_) |
                PayoutError::PayoutInProgress(_) |
                PayoutError::InvalidInput(_) |
                PayoutError::MissingPhone(_) |
                PayoutError::InvalidPhoneFormat(_) => StatusCode::BAD_REQUEST,
            },
            Self::Payment(e) => match e {
                PaymentApiError::NotFound(_) => StatusCode::NOT_FOUND,
                PaymentApiError::PaymentAlreadyExists(_) => StatusCode::CONFLICT,
                PaymentApiError::StatusConflict(_) => StatusCode::CONFLICT,
                PaymentApiError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                PaymentApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                PaymentApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ Request failed with {status}. {self}");
        }
        // A failed disbursement has been recorded against the payment, so say so
        let data = match self {
            Self::Payout(PayoutError::DisbursementFailed(msg)) => Some(json!({ "status": "failed", "error": msg })),
            _ => None,
        };
        let body = JsonResponse { success: false, message: self.to_string(), data };
        HttpResponse::build(status).insert_header(ContentType::json()).json(body)
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        Self::BackendError(e.to_string())
    }
}
