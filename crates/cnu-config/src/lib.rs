//! Uploader configuration.
//!
//! [`load_settings`] builds a [`Settings`] value from defaults, an optional
//! TOML file and environment variables. The result is passed explicitly to
//! the clients and the workflow; nothing here is global.

mod error;
mod loader;
mod secret;
mod settings;

pub use error::{ConfigError, Result};
pub use loader::{apply_env, load_settings, read_settings_file, settings_path};
pub use secret::Secret;
pub use settings::{
    DEFAULT_AUDIT_TABLE, Environment, QBenchCredentials, QBenchEndpoint, QBenchSettings,
    SANDBOX_QBENCH_URL, Settings, SupabaseSettings, UploadSettings,
};
