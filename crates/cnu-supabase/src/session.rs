//! Authenticated user session.

use std::fmt;

use serde::Deserialize;

/// Session returned by a password sign-in.
#[derive(Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: SessionUser,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    /// Name recorded as `created_by` on audit rows.
    pub fn display_name(&self) -> &str {
        self.user.email.as_deref().unwrap_or(&self.user.id)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_and_redact() {
        let session: Session = serde_json::from_str(
            r#"{"access_token": "jwt-value", "token_type": "bearer", "expires_in": 3600,
                "refresh_token": "r", "user": {"id": "u-1", "email": "analyst@lab.test"}}"#,
        )
        .unwrap();
        assert_eq!(session.display_name(), "analyst@lab.test");
        let debug = format!("{session:?}");
        assert!(!debug.contains("jwt-value"));
        assert!(debug.contains("analyst@lab.test"));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let session: Session =
            serde_json::from_str(r#"{"access_token": "t", "user": {"id": "u-1"}}"#).unwrap();
        assert_eq!(session.display_name(), "u-1");
    }
}
