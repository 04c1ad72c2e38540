//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! CDN call failures have their own classified type, [`ProviderError`], so the
//! retry loop can branch on the failure class.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed message {message_id}: {reason}")]
    MalformedMessage { message_id: String, reason: String },

    #[error("CDN error: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, Error>;

pub const TOO_MANY_INVALIDATIONS: &str = "TooManyInvalidationsInProgress";
pub const ACCESS_DENIED: &str = "AccessDenied";

/// Classified failure of a single CreateInvalidation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The distribution already has the maximum number of in-flight
    /// invalidations (15 on CloudFront).
    #[error("Too many invalidations in progress: {0}")]
    TooManyInvalidations(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("{code} - {message}")]
    Service { code: String, message: String },

    /// Transport, timeout, or request construction failures.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ProviderError {
    /// Classify a provider error from its machine-readable code.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            TOO_MANY_INVALIDATIONS => Self::TooManyInvalidations(message),
            ACCESS_DENIED => Self::AccessDenied(message),
            _ => Self::Service {
                code: code.to_string(),
                message,
            },
        }
    }

    /// Everything except a permission failure is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::AccessDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_classifies_known_codes() {
        assert_eq!(
            ProviderError::from_code("TooManyInvalidationsInProgress", "busy"),
            ProviderError::TooManyInvalidations("busy".to_string())
        );
        assert_eq!(
            ProviderError::from_code("AccessDenied", "nope"),
            ProviderError::AccessDenied("nope".to_string())
        );
        assert_eq!(
            ProviderError::from_code("NoSuchDistribution", "missing"),
            ProviderError::Service {
                code: "NoSuchDistribution".to_string(),
                message: "missing".to_string(),
            }
        );
    }

    #[test]
    fn test_only_access_denied_is_terminal() {
        assert!(!ProviderError::AccessDenied(String::new()).is_retryable());
        assert!(ProviderError::TooManyInvalidations(String::new()).is_retryable());
        assert!(ProviderError::Unexpected("timeout".to_string()).is_retryable());
        assert!(ProviderError::from_code("InternalError", "boom").is_retryable());
    }

    #[test]
    fn test_service_error_display() {
        let err = ProviderError::from_code("Throttling", "slow down");
        assert_eq!(err.to_string(), "Throttling - slow down");
    }
}
