//! Error taxonomy for the scan pipeline
//!
//! Every failure that can reach a client maps to exactly one of these
//! kinds; raw network or parse errors never cross the API boundary.

use thiserror::Error;

/// Pipeline failure, classified for transport-level status mapping
#[derive(Debug, Error)]
pub enum ScanError {
    /// Unusable caller input (missing URL, empty report set); never retried
    #[error("{0}")]
    Validation(String),

    /// A required secret or setting is absent; fails before any network call
    #[error("{0}")]
    Configuration(String),

    /// An external provider returned a non-success or unreadable response
    #[error("{0}")]
    Provider(String),

    /// The provider response lacks a structural section that cannot be
    /// papered over with sentinels
    #[error("{0}")]
    MalformedPayload(String),
}

impl ScanError {
    /// Whether the failure is the caller's fault (4xx-class)
    pub fn is_client_error(&self) -> bool {
        matches!(self, ScanError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_message_through() {
        let err = ScanError::Provider("PSI API error (500): backend".to_string());
        assert_eq!(err.to_string(), "PSI API error (500): backend");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(ScanError::Validation("url is required".into()).is_client_error());
        assert!(!ScanError::Configuration("missing key".into()).is_client_error());
        assert!(!ScanError::Provider("boom".into()).is_client_error());
        assert!(!ScanError::MalformedPayload("no audits".into()).is_client_error());
    }
}
