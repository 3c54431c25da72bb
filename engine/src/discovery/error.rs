//! Discovery error types

use thiserror::Error;

/// Failure while listing fields or searching options.
///
/// Cloneable so one in-flight result can be handed to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("Discovery configuration error: {0}")]
    Config(String),

    #[error("Discovery request failed: {0}")]
    Request(String),

    #[error("Discovery endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("Invalid discovery response: {0}")]
    Decode(String),
}

impl DiscoveryError {
    /// Connection failures, timeouts, 429 and 5xx responses are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status { status } => *status == 429 || *status >= 500,
            Self::Config(_) | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = DiscoveryError::Status { status: 503 };
        assert_eq!(err.to_string(), "Discovery endpoint returned HTTP 503");
    }

    #[test]
    fn test_transient_classification() {
        assert!(DiscoveryError::Request("connection refused".to_string()).is_transient());
        assert!(DiscoveryError::Status { status: 502 }.is_transient());
        assert!(DiscoveryError::Status { status: 429 }.is_transient());
        assert!(!DiscoveryError::Status { status: 404 }.is_transient());
        assert!(!DiscoveryError::Decode("expected object".to_string()).is_transient());
    }
}
