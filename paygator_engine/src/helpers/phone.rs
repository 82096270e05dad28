//! Vendor phone number rules for the disbursement rail.
//!
//! The rail only accepts local mobile numbers: a two-digit operator prefix drawn from a fixed set followed by seven
//! digits. Vendors often store their number in international form, so the country code is stripped first.
use regex::Regex;
use thiserror::Error;

pub const DEFAULT_COUNTRY_CODE: &str = "258";
pub const DEFAULT_ACCEPTED_PREFIXES: [&str; 2] = ["86", "87"];

#[derive(Debug, Clone, Error)]
pub enum PhoneRulesError {
    #[error("Invalid phone rule configuration. {0}")]
    InvalidConfiguration(String),
    #[error("Phone number {0} is not a valid local mobile number for this rail")]
    InvalidPhoneFormat(String),
}

#[derive(Debug, Clone)]
pub struct PhoneRules {
    country_code: String,
    accepted_prefixes: Vec<String>,
    local_number: Regex,
}

fn local_number_regex(prefixes: &[String]) -> Result<Regex, PhoneRulesError> {
    Regex::new(&format!(r"^(?:{})\d{{7}}$", prefixes.join("|")))
        .map_err(|e| PhoneRulesError::InvalidConfiguration(e.to_string()))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

impl PhoneRules {
    pub fn new<S: AsRef<str>>(country_code: &str, accepted_prefixes: &[S]) -> Result<Self, PhoneRulesError> {
        let country_code = country_code.trim().trim_start_matches('+').to_string();
        if !is_digits(&country_code) {
            return Err(PhoneRulesError::InvalidConfiguration(format!("'{country_code}' is not a country code")));
        }
        let prefixes = accepted_prefixes.iter().map(|p| p.as_ref().trim().to_string()).collect::<Vec<_>>();
        if prefixes.is_empty() {
            return Err(PhoneRulesError::InvalidConfiguration("At least one mobile prefix is required".into()));
        }
        if let Some(bad) = prefixes.iter().find(|p| p.len() != 2 || !is_digits(p)) {
            return Err(PhoneRulesError::InvalidConfiguration(format!("'{bad}' is not a two-digit mobile prefix")));
        }
        let local_number = local_number_regex(&prefixes)?;
        Ok(Self { country_code, accepted_prefixes: prefixes, local_number })
    }

    /// The rules for M-Pesa Mozambique: country code 258, Vodacom prefixes 86 and 87.
    pub fn try_default() -> Result<Self, PhoneRulesError> {
        Self::new(DEFAULT_COUNTRY_CODE, &DEFAULT_ACCEPTED_PREFIXES)
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn accepted_prefixes(&self) -> &[String] {
        &self.accepted_prefixes
    }

    /// Converts `phone` into the local format expected by the rail, or explains why it cannot be used.
    ///
    /// Spaces, dashes and dots are ignored. A leading `+`, `00` or the bare country code is removed before matching.
    /// Numbers in international form (`+` or `00`) must carry the configured country code.
    pub fn to_local(&self, phone: &str) -> Result<String, PhoneRulesError> {
        let digits = phone.chars().filter(|c| !matches!(c, ' ' | '-' | '.')).collect::<String>();
        let mut local = digits.as_str();
        if let Some(rest) = local.strip_prefix('+').or_else(|| local.strip_prefix("00")) {
            local = rest
                .strip_prefix(self.country_code.as_str())
                .ok_or_else(|| PhoneRulesError::InvalidPhoneFormat(phone.to_string()))?;
        } else if local.len() > 9 {
            local = local.strip_prefix(self.country_code.as_str()).unwrap_or(local);
        }
        if self.local_number.is_match(local) {
            Ok(local.to_string())
        } else {
            Err(PhoneRulesError::InvalidPhoneFormat(phone.to_string()))
        }
    }
}
