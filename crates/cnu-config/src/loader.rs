//! Settings loading: defaults, then a TOML file, then environment variables.
//!
//! The settings file lives in the platform-specific config folder unless a
//! path is given explicitly:
//! - macOS: ~/Library/Application Support/com.cn-upload.CN-Upload-Results/
//! - Windows: %APPDATA%/cn-upload/CN Upload Results/config/
//! - Linux: ~/.config/cnuploadresults/

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{ConfigError, Result};
use crate::secret::Secret;
use crate::settings::Settings;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "cn-upload";
const APP_NAME: &str = "CN Upload Results";
const CONFIG_FILENAME: &str = "settings.toml";

/// Get the path to the default settings file.
///
/// Returns `None` if the platform-specific directory cannot be determined.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Load settings from all layers using the process environment.
///
/// An explicit `path` must exist; the default path is optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => match settings_path() {
            Some(default_path) if default_path.exists() => read_settings_file(&default_path)?,
            Some(default_path) => {
                tracing::debug!("No settings file at {:?}, using defaults", default_path);
                Settings::default()
            }
            None => {
                tracing::warn!("Could not determine settings path, using defaults");
                Settings::default()
            }
        },
    };
    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

/// Parse a TOML settings file.
pub fn read_settings_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::info!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Overlay environment variables read through `lookup`.
///
/// Empty values are ignored so an exported-but-blank variable does not
/// erase a value from the settings file.
pub fn apply_env<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(value) = get("CNU_ENVIRONMENT") {
        settings.environment = value.parse()?;
    }

    if let Some(value) = get("QBENCH_BASE_URL") {
        settings.qbench.base_url = Some(value);
    }
    if let Some(value) = get("QBENCH_API_KEY") {
        settings.qbench.api_key = Some(Secret::new(value));
    }
    if let Some(value) = get("QBENCH_CLIENT_ID") {
        settings.qbench.client_id = Some(value);
    }
    if let Some(value) = get("QBENCH_CLIENT_SECRET") {
        settings.qbench.client_secret = Some(Secret::new(value));
    }
    if let Some(value) = get("QBENCH_TOKEN_URL") {
        settings.qbench.token_url = Some(value);
    }

    if let Some(value) = get("SUPABASE_URL") {
        settings.supabase.url = value;
    }
    if let Some(value) = get("SUPABASE_ANON_KEY") {
        settings.supabase.anon_key = Secret::new(value);
    }
    if let Some(value) = get("SUPABASE_SERVICE_ROLE_KEY") {
        settings.supabase.service_role_key = Some(Secret::new(value));
    }
    if let Some(value) = get("SUPABASE_TABLE") {
        settings.supabase.table = value;
    }

    if let Some(value) = get("CNU_DRY_RUN") {
        settings.upload.dry_run = parse_flag("CNU_DRY_RUN", &value)?;
    }
    if let Some(value) = get("CNU_SKIP_PROCESSED_TESTS") {
        settings.upload.skip_processed_tests = parse_flag("CNU_SKIP_PROCESSED_TESTS", &value)?;
    }
    if let Some(value) = get("CNU_STRICT_NUMERIC") {
        settings.upload.strict_numeric = parse_flag("CNU_STRICT_NUMERIC", &value)?;
    }
    Ok(())
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_settings_path_exists() {
        assert!(settings_path().is_some());
    }

    #[test]
    fn test_default_settings_serializable() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(settings, parsed);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "yes").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }

    #[test]
    fn test_env_ignores_blank_values() {
        let env = HashMap::from([("SUPABASE_URL", "   ")]);
        let mut settings = Settings::default();
        settings.supabase.url = "https://from-file.supabase.co".to_string();
        apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.supabase.url, "https://from-file.supabase.co");
    }
}
