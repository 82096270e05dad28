mod phone;
mod reference;

pub use phone::{PhoneRules, PhoneRulesError, DEFAULT_ACCEPTED_PREFIXES, DEFAULT_COUNTRY_CODE};
pub use reference::{generate_reference, DEFAULT_REFERENCE_MAX_LEN};
