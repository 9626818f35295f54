//! Error types for the Supabase client.

use thiserror::Error;

/// Errors returned by Supabase requests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SupabaseError {
    /// Sign-in was rejected.
    #[error("Supabase sign-in failed: {message}")]
    Auth { message: String },

    /// The audit row was not stored.
    #[error("failed to store upload record (HTTP {status}): {body}")]
    Persistence { status: u16, body: String },

    /// The request did not complete.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("unexpected Supabase response: {0}")]
    Decode(String),
}

impl SupabaseError {
    /// Returns a user-friendly error message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth { .. } => "Invalid email or password.".to_string(),
            Self::Persistence { status, .. } => {
                format!("The run could not be saved to the audit table (HTTP {status}).")
            }
            Self::Network(_) => {
                "Could not connect to Supabase. Please check your internet connection."
                    .to_string()
            }
            Self::Decode(_) => "Supabase sent a response that could not be read.".to_string(),
        }
    }
}

impl From<reqwest::Error> for SupabaseError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type alias for Supabase operations.
pub type Result<T> = std::result::Result<T, SupabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = SupabaseError::Auth {
            message: "invalid_grant".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid email or password.");

        let err = SupabaseError::Persistence {
            status: 409,
            body: "duplicate key".to_string(),
        };
        assert!(err.user_message().contains("409"));
        assert!(err.to_string().contains("duplicate key"));
    }
}
