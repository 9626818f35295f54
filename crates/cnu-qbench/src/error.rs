//! Error types for the QBench client.

use thiserror::Error;

/// Errors returned by QBench requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QBenchError {
    /// Credentials were rejected or no token is available.
    #[error("QBench authentication failed: {message}")]
    Auth { message: String },

    /// The sample does not exist in QBench.
    #[error("sample {sample_id} not found in QBench")]
    NotFound { sample_id: String },

    /// QBench answered with a non-success status.
    #[error("QBench returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// The request did not complete.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("unexpected QBench response: {0}")]
    Decode(String),
}

impl QBenchError {
    /// Returns a user-friendly error message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth { .. } => {
                "QBench rejected the credentials. Check the API key or client secret.".to_string()
            }
            Self::NotFound { sample_id } => format!("Sample {sample_id} does not exist in QBench."),
            Self::Remote { status, .. } => format!("QBench rejected the request (HTTP {status})."),
            Self::Network(_) => {
                "Could not connect to QBench. Please check your internet connection.".to_string()
            }
            Self::Decode(_) => "QBench sent a response that could not be read.".to_string(),
        }
    }

    /// Returns whether a later attempt could succeed without changes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Remote { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for QBenchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for QBenchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias for QBench operations.
pub type Result<T> = std::result::Result<T, QBenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = QBenchError::NotFound {
            sample_id: "14956".to_string(),
        };
        assert!(err.user_message().contains("14956"));

        let err = QBenchError::Network("connection refused".to_string());
        assert!(err.user_message().contains("internet connection"));
    }

    #[test]
    fn test_retryable() {
        assert!(QBenchError::Network("timeout".to_string()).is_retryable());
        assert!(
            QBenchError::Remote {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !QBenchError::Remote {
                status: 422,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !QBenchError::Auth {
                message: "bad".to_string()
            }
            .is_retryable()
        );
    }
}
