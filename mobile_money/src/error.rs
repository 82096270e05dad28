use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobileMoneyError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Access token request failed: {0}")]
    TokenRequestError(String),
    #[error("Access token was rejected. Error {status}. {message}")]
    TokenRejected { status: u16, message: String },
    #[error("Could not send B2C request: {0}")]
    RequestError(String),
    #[error("Could not read B2C response: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}
