//! Settings types for the uploader.
//!
//! Settings are built once at the entry point (CLI or desktop app) and passed
//! by reference to every component that needs them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::secret::Secret;

/// Default QBench host for the sandbox environment.
pub const SANDBOX_QBENCH_URL: &str = "https://sandbox.qbench.net";

/// Default Supabase table holding one audit row per run.
pub const DEFAULT_AUDIT_TABLE: &str = "cn_upload_results";

/// Path of the QBench token endpoint relative to the base URL.
const QBENCH_TOKEN_PATH: &str = "/qbench/oauth2/v1/token";

// ============================================================================
// Main Settings Struct
// ============================================================================

/// Application settings (TOML file overlaid by environment variables).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub environment: Environment,
    pub qbench: QBenchSettings,
    pub supabase: SupabaseSettings,
    pub upload: UploadSettings,
}

/// Target QBench deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Invalid {
                key: "CNU_ENVIRONMENT",
                reason: format!("expected 'sandbox' or 'production', got '{other}'"),
            }),
        }
    }
}

// ============================================================================
// QBench
// ============================================================================

/// QBench endpoint and credentials.
///
/// Either `api_key` or the `client_id`/`client_secret` pair must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QBenchSettings {
    /// Base URL; falls back to the sandbox host outside production.
    pub base_url: Option<String>,
    pub api_key: Option<Secret>,
    pub client_id: Option<String>,
    pub client_secret: Option<Secret>,
    /// Token endpoint; defaults to the standard path under `base_url`.
    pub token_url: Option<String>,
}

/// Resolved QBench connection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QBenchEndpoint {
    pub base_url: String,
    pub token_url: String,
    pub credentials: QBenchCredentials,
}

/// How the uploader authenticates against QBench.
#[derive(Debug, Clone, PartialEq)]
pub enum QBenchCredentials {
    ApiKey(Secret),
    ClientCredentials {
        client_id: String,
        client_secret: Secret,
    },
}

// ============================================================================
// Supabase
// ============================================================================

/// Supabase project used for sign-in and the audit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: Secret,
    /// Used for inserts when no user session is available.
    pub service_role_key: Option<Secret>,
    pub table: String,
}

impl Default for SupabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: Secret::default(),
            service_role_key: None,
            table: DEFAULT_AUDIT_TABLE.to_string(),
        }
    }
}

// ============================================================================
// Upload flags
// ============================================================================

/// Run behavior flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Plan and report without sending anything to QBench or Supabase.
    pub dry_run: bool,
    /// Leave QBench tests alone when their worksheet already holds values.
    pub skip_processed_tests: bool,
    /// Fail the parse on text in a numeric cell instead of reading it as missing.
    pub strict_numeric: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_processed_tests: true,
            strict_numeric: false,
        }
    }
}

impl Settings {
    /// Resolve the QBench endpoint for the selected environment.
    pub fn qbench_endpoint(&self) -> Result<QBenchEndpoint> {
        let base_url = match non_empty(self.qbench.base_url.as_deref()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.environment.is_production() => {
                return Err(ConfigError::Missing {
                    key: "QBENCH_BASE_URL",
                });
            }
            None => SANDBOX_QBENCH_URL.to_string(),
        };
        check_http_url("QBENCH_BASE_URL", &base_url)?;

        let token_url = match non_empty(self.qbench.token_url.as_deref()) {
            Some(url) => url.to_string(),
            None => format!("{base_url}{QBENCH_TOKEN_PATH}"),
        };
        check_http_url("QBENCH_TOKEN_URL", &token_url)?;

        let credentials = match (&self.qbench.api_key, &self.qbench.client_id, &self.qbench.client_secret)
        {
            (Some(key), _, _) if !key.is_empty() => QBenchCredentials::ApiKey(key.clone()),
            (_, Some(id), Some(secret)) if !id.trim().is_empty() && !secret.is_empty() => {
                QBenchCredentials::ClientCredentials {
                    client_id: id.trim().to_string(),
                    client_secret: secret.clone(),
                }
            }
            (_, Some(id), _) if !id.trim().is_empty() => {
                return Err(ConfigError::Missing {
                    key: "QBENCH_CLIENT_SECRET",
                });
            }
            _ => {
                return Err(ConfigError::Missing {
                    key: "QBENCH_API_KEY",
                });
            }
        };

        Ok(QBenchEndpoint {
            base_url,
            token_url,
            credentials,
        })
    }

    /// Validate the Supabase section.
    pub fn validate_supabase(&self) -> Result<()> {
        if self.supabase.url.trim().is_empty() {
            return Err(ConfigError::Missing { key: "SUPABASE_URL" });
        }
        check_http_url("SUPABASE_URL", self.supabase.url.trim())?;
        if self.supabase.anon_key.is_empty() {
            return Err(ConfigError::Missing {
                key: "SUPABASE_ANON_KEY",
            });
        }
        if self.supabase.table.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "SUPABASE_TABLE",
                reason: "table name is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Validate everything a full run needs.
    pub fn validate(&self) -> Result<()> {
        self.qbench_endpoint()?;
        self.validate_supabase()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_http_url(key: &'static str, url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("'{url}' is not an http(s) URL"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_api_key() -> Settings {
        let mut settings = Settings::default();
        settings.qbench.api_key = Some(Secret::new("key"));
        settings
    }

    #[test]
    fn sandbox_uses_default_host() {
        let endpoint = with_api_key().qbench_endpoint().unwrap();
        assert_eq!(endpoint.base_url, SANDBOX_QBENCH_URL);
        assert_eq!(
            endpoint.token_url,
            "https://sandbox.qbench.net/qbench/oauth2/v1/token"
        );
        assert!(matches!(endpoint.credentials, QBenchCredentials::ApiKey(_)));
    }

    #[test]
    fn production_requires_explicit_url() {
        let mut settings = with_api_key();
        settings.environment = Environment::Production;
        let err = settings.qbench_endpoint().unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "QBENCH_BASE_URL" }));

        settings.qbench.base_url = Some("https://lab.qbench.net/".to_string());
        let endpoint = settings.qbench_endpoint().unwrap();
        assert_eq!(endpoint.base_url, "https://lab.qbench.net");
    }

    #[test]
    fn client_credentials_need_secret() {
        let mut settings = Settings::default();
        settings.qbench.client_id = Some("client".to_string());
        let err = settings.qbench_endpoint().unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "QBENCH_CLIENT_SECRET" }));

        settings.qbench.client_secret = Some(Secret::new("s3cret"));
        let endpoint = settings.qbench_endpoint().unwrap();
        assert!(matches!(
            endpoint.credentials,
            QBenchCredentials::ClientCredentials { ref client_id, .. } if client_id == "client"
        ));
    }

    #[test]
    fn rejects_non_http_urls() {
        let mut settings = with_api_key();
        settings.qbench.base_url = Some("ftp://example.com".to_string());
        assert!(matches!(
            settings.qbench_endpoint(),
            Err(ConfigError::Invalid { key: "QBENCH_BASE_URL", .. })
        ));
    }

    #[test]
    fn supabase_requires_url_and_key() {
        let mut settings = with_api_key();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Missing { key: "SUPABASE_URL" })
        ));
        settings.supabase.url = "https://project.supabase.co".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Missing { key: "SUPABASE_ANON_KEY" })
        ));
        settings.supabase.anon_key = Secret::new("anon");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn environment_parses() {
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("sandbox".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut settings = with_api_key();
        settings.supabase.anon_key = Secret::new("anon-key-value");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("anon-key-value"));
        assert!(debug.contains("<redacted>"));
    }
}
