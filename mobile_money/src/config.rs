use std::{env, time::Duration};

use log::*;
use paygator_common::Secret;

const DEFAULT_BASE_URL: &str = "https://e2payments.explicador.co.mz";
const DEFAULT_TOKEN_PATH: &str = "/oauth/token";
const DEFAULT_PAYMENT_PATH: &str = "/v1/b2c/mpesa-payment/{wallet_id}";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct MobileMoneyConfig {
    /// Scheme and host of the aggregator, e.g. "https://e2payments.explicador.co.mz"
    pub base_url: String,
    pub token_path: String,
    /// Path of the B2C endpoint. The `{wallet_id}` placeholder is replaced with [`Self::wallet_id`].
    pub payment_path: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub wallet_id: String,
    /// Upper bound for any single HTTP exchange with the aggregator.
    pub request_timeout: Duration,
}

impl Default for MobileMoneyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            payment_path: DEFAULT_PAYMENT_PATH.to_string(),
            client_id: String::default(),
            client_secret: Secret::default(),
            wallet_id: String::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl MobileMoneyConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let base_url = env::var("PAYGATOR_B2C_BASE_URL").unwrap_or_else(|_| {
            warn!("PAYGATOR_B2C_BASE_URL not set, using {DEFAULT_BASE_URL} as default");
            defaults.base_url.clone()
        });
        let token_path = env::var("PAYGATOR_B2C_TOKEN_PATH").unwrap_or(defaults.token_path);
        let payment_path = env::var("PAYGATOR_B2C_PAYMENT_PATH").unwrap_or(defaults.payment_path);
        let client_id = env::var("PAYGATOR_B2C_CLIENT_ID").unwrap_or_else(|_| {
            warn!("PAYGATOR_B2C_CLIENT_ID not set. Vendor payouts will be rejected by the aggregator.");
            String::default()
        });
        let client_secret = Secret::new(env::var("PAYGATOR_B2C_CLIENT_SECRET").unwrap_or_else(|_| {
            warn!("PAYGATOR_B2C_CLIENT_SECRET not set. Vendor payouts will be rejected by the aggregator.");
            String::default()
        }));
        let wallet_id = env::var("PAYGATOR_B2C_WALLET_ID").unwrap_or_else(|_| {
            warn!("PAYGATOR_B2C_WALLET_ID not set. Vendor payouts will be rejected by the aggregator.");
            String::default()
        });
        let request_timeout = env::var("PAYGATOR_B2C_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Ignoring invalid PAYGATOR_B2C_TIMEOUT_SECS ({s}): {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        Self { base_url, token_path, payment_path, client_id, client_secret, wallet_id, request_timeout }
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.token_path)
    }

    pub fn payment_url(&self) -> String {
        let path = self.payment_path.replace("{wallet_id}", &self.wallet_id);
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}
