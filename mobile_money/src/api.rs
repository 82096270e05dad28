use std::sync::Arc;

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
    StatusCode,
};
use tokio::sync::RwLock;

use crate::{
    config::MobileMoneyConfig,
    data_objects::{AccessToken, B2cPaymentRequest, B2cPaymentResponse, TokenResponse},
    MobileMoneyError,
};

#[derive(Clone)]
pub struct MobileMoneyApi {
    config: MobileMoneyConfig,
    client: Arc<Client>,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl MobileMoneyApi {
    pub fn new(config: MobileMoneyConfig) -> Result<Self, MobileMoneyError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MobileMoneyError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(RwLock::new(None)) })
    }

    pub fn config(&self) -> &MobileMoneyConfig {
        &self.config
    }

    /// Returns a cached bearer token, requesting a new one if there is none or it is about to expire.
    pub async fn access_token(&self) -> Result<String, MobileMoneyError> {
        if let Some(token) = self.token.read().await.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }
        let mut guard = self.token.write().await;
        // Another task may have refreshed the token while we waited for the lock
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }
        let token = self.fetch_token().await?;
        let value = token.token.clone();
        *guard = Some(token);
        Ok(value)
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    async fn fetch_token(&self) -> Result<AccessToken, MobileMoneyError> {
        let url = self.config.token_url();
        debug!("📲️ Requesting B2C access token from {url}");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.reveal().as_str()),
        ];
        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| MobileMoneyError::TokenRequestError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("📲️ Access token request was rejected. {status}: {message}");
            return Err(MobileMoneyError::TokenRejected { status: status.as_u16(), message });
        }
        let token =
            response.json::<TokenResponse>().await.map_err(|e| MobileMoneyError::JsonError(e.to_string()))?;
        trace!("📲️ Access token received. Expires in {:?}s", token.expires_in);
        Ok(AccessToken::from_response(token, Utc::now()))
    }

    /// Sends a B2C transfer. An `Ok` result only means that the aggregator answered; check
    /// [`B2cPaymentResponse::success`] to see whether the transfer was accepted.
    ///
    /// A 401 answer invalidates the cached token and the request is retried once with a fresh one.
    pub async fn b2c_payment(&self, request: &B2cPaymentRequest) -> Result<B2cPaymentResponse, MobileMoneyError> {
        let response = self.send_b2c_payment(request).await?;
        if response.status == StatusCode::UNAUTHORIZED.as_u16() {
            info!("📲️ B2C request for {} was unauthorized. Refreshing the access token and retrying", request.reference);
            self.clear_token().await;
            return self.send_b2c_payment(request).await;
        }
        Ok(response)
    }

    async fn send_b2c_payment(&self, request: &B2cPaymentRequest) -> Result<B2cPaymentResponse, MobileMoneyError> {
        let token = self.access_token().await?;
        let url = self.config.payment_url();
        debug!("📲️ Sending B2C transfer of {} to {} ({})", request.amount, request.phone, request.reference);
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .form(&request.form_fields(&self.config.client_id))
            .send()
            .await
            .map_err(|e| MobileMoneyError::RequestError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| MobileMoneyError::ResponseError(e.to_string()))?;
        trace!("📲️ B2C response ({status}): {body}");
        Ok(B2cPaymentResponse::from_body(status, &body))
    }
}
