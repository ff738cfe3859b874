//! Email syntax validation
//!
//! Runs at the service boundary; the runtime itself treats keys as opaque.

use once_cell::sync::Lazy;
use regex::Regex;
use smartcache_core::ENTITY_KEY_LENGTH_BYTES_MAX;

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[a-zA-Z]{2,}$").ok());

/// Whether `email` is a syntactically plausible address
pub fn is_valid_email(email: &str) -> bool {
    if email.trim().is_empty() || email.len() > ENTITY_KEY_LENGTH_BYTES_MAX {
        return false;
    }
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}
