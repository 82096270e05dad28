use std::{env, time::Duration};

use log::*;
use mobile_money::MobileMoneyConfig;
use paygator_common::{parse_boolean_flag, parse_list, Secret};
use paygator_engine::{
    helpers::{PhoneRules, DEFAULT_ACCEPTED_PREFIXES, DEFAULT_COUNTRY_CODE, DEFAULT_REFERENCE_MAX_LEN},
    PayoutConfig,
    DEFAULT_DISBURSEMENT_TIMEOUT,
};

use crate::errors::ServerError;

const DEFAULT_PAYGATOR_HOST: &str = "127.0.0.1";
const DEFAULT_PAYGATOR_PORT: u16 = 8360;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Bring the schema up to date before the server starts accepting requests.
    pub run_migrations: bool,
    /// The key that the payout and admin endpoints require. If empty, those endpoints reject every request.
    pub api_key: Secret<String>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    pub payouts: PayoutSettings,
    pub mobile_money: MobileMoneyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PAYGATOR_HOST.to_string(),
            port: DEFAULT_PAYGATOR_PORT,
            database_url: String::default(),
            run_migrations: true,
            api_key: Secret::default(),
            use_x_forwarded_for: false,
            payouts: PayoutSettings::default(),
            mobile_money: MobileMoneyConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PAYGATOR_HOST").ok().unwrap_or_else(|| DEFAULT_PAYGATOR_HOST.into());
        let port = env::var("PAYGATOR_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PAYGATOR_PORT. {e} Using the default, {DEFAULT_PAYGATOR_PORT}, \
                         instead."
                    );
                    DEFAULT_PAYGATOR_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PAYGATOR_PORT);
        let database_url = env::var("PAYGATOR_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PAYGATOR_DATABASE_URL is not set. Please set it to the URL for the Paygator database.");
            String::default()
        });
        let run_migrations = parse_boolean_flag(env::var("PAYGATOR_RUN_MIGRATIONS").ok(), true);
        let api_key = Secret::new(env::var("PAYGATOR_API_KEY").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ PAYGATOR_API_KEY is not set. The vendor payout and admin endpoints will reject every request until \
                 it is."
            );
            String::default()
        }));
        let use_x_forwarded_for = parse_boolean_flag(env::var("PAYGATOR_USE_X_FORWARDED_FOR").ok(), false);
        let mobile_money = MobileMoneyConfig::new_from_env_or_default();
        let payouts = PayoutSettings::from_env_or_default(mobile_money.request_timeout);
        Self { host, port, database_url, run_migrations, api_key, use_x_forwarded_for, payouts, mobile_money }
    }
}

//-------------------------------------------------  ProxyConfig  ------------------------------------------------------
/// How to identify the client behind a request, when the server sits behind a reverse proxy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyConfig {
    pub use_x_forwarded_for: bool,
}

impl ProxyConfig {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for }
    }
}

//-------------------------------------------------  PayoutSettings  ---------------------------------------------------
/// The rail-specific rules for vendor payouts.
#[derive(Clone, Debug)]
pub struct PayoutSettings {
    pub country_code: String,
    pub accepted_prefixes: Vec<String>,
    pub reference_max_len: usize,
    pub disbursement_timeout: Duration,
}

impl Default for PayoutSettings {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            accepted_prefixes: DEFAULT_ACCEPTED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            reference_max_len: DEFAULT_REFERENCE_MAX_LEN,
            disbursement_timeout: DEFAULT_DISBURSEMENT_TIMEOUT,
        }
    }
}

impl PayoutSettings {
    /// The disbursement timeout is shared with the B2C client's own request timeout (`PAYGATOR_B2C_TIMEOUT_SECS`).
    pub fn from_env_or_default(disbursement_timeout: Duration) -> Self {
        let defaults = Self::default();
        let country_code = env::var("PAYGATOR_B2C_COUNTRY_CODE").ok().unwrap_or_else(|| {
            info!("🪛️ PAYGATOR_B2C_COUNTRY_CODE is not set. Using the default, {}.", defaults.country_code);
            defaults.country_code.clone()
        });
        let accepted_prefixes = env::var("PAYGATOR_B2C_ACCEPTED_PREFIXES")
            .map(|s| parse_list(&s))
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                info!(
                    "🪛️ PAYGATOR_B2C_ACCEPTED_PREFIXES is not set. Using the default, {}.",
                    defaults.accepted_prefixes.join(",")
                );
                defaults.accepted_prefixes.clone()
            });
        let reference_max_len = env::var("PAYGATOR_B2C_REFERENCE_MAX_LEN")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PAYGATOR_B2C_REFERENCE_MAX_LEN. {e}"))
                    .ok()
            })
            .unwrap_or(defaults.reference_max_len);
        Self { country_code, accepted_prefixes, reference_max_len, disbursement_timeout }
    }

    /// Builds the engine's payout configuration, validating the phone rules on the way.
    pub fn payout_config(&self) -> Result<PayoutConfig, ServerError> {
        let rules = PhoneRules::new(&self.country_code, &self.accepted_prefixes)
            .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        Ok(PayoutConfig::new(rules)
            .with_reference_max_len(self.reference_max_len)
            .with_timeout(self.disbursement_timeout))
    }
}
