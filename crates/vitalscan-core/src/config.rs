//! Environment-sourced configuration
//!
//! Secrets are read once and threaded into the provider clients as plain
//! values; business logic never touches the environment directly.

use crate::error::ScanError;

/// Environment variable holding the measurement-provider API key
pub const PSI_KEY_VAR: &str = "GOOGLE_PSI_API_KEY";

/// Environment variable holding the text-generation API key
pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Read a required variable, treating blank values as absent
pub fn require_env(name: &str) -> Result<String, ScanError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ScanError::Configuration(format!("{name} is not configured")))
}

/// Both provider secrets, resolved up front for frontends that run the
/// whole pipeline
#[derive(Debug, Clone)]
pub struct Config {
    pub psi_api_key: String,
    pub anthropic_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ScanError> {
        Ok(Self {
            psi_api_key: require_env(PSI_KEY_VAR)?,
            anthropic_api_key: require_env(ANTHROPIC_KEY_VAR)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_env_missing() {
        let err = require_env("VITALSCAN_TEST_UNSET_VAR").unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
        assert!(err.to_string().contains("VITALSCAN_TEST_UNSET_VAR"));
    }

    #[test]
    fn test_require_env_present() {
        // Safety: test-local variable, no other test reads it.
        unsafe { std::env::set_var("VITALSCAN_TEST_SET_VAR", "secret") };
        assert_eq!(require_env("VITALSCAN_TEST_SET_VAR").unwrap(), "secret");
        unsafe { std::env::remove_var("VITALSCAN_TEST_SET_VAR") };
    }

    #[test]
    fn test_require_env_blank_is_absent() {
        unsafe { std::env::set_var("VITALSCAN_TEST_BLANK_VAR", "   ") };
        assert!(require_env("VITALSCAN_TEST_BLANK_VAR").is_err());
        unsafe { std::env::remove_var("VITALSCAN_TEST_BLANK_VAR") };
    }
}
