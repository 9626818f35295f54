//! Errors that abort a run before any sample is processed.

use cnu_config::ConfigError;
use cnu_ingest::ParseError;
use cnu_qbench::QBenchError;
use cnu_supabase::SupabaseError;
use thiserror::Error;

/// A run-level failure. Per-sample problems never surface here; they are
/// recorded on the report instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The workbook could not be parsed; nothing was sent anywhere.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// QBench could not be reached or rejected the credentials.
    #[error("could not connect to QBench: {0}")]
    Connect(#[source] QBenchError),

    /// The Supabase client could not be created.
    #[error("could not set up Supabase: {0}")]
    Audit(#[source] SupabaseError),
}

impl RunError {
    /// Message suitable for the status overlay or CLI output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Parse(err) => err.user_message(),
            Self::Connect(err) => err.user_message(),
            Self::Audit(err) => err.user_message(),
        }
    }
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, RunError>;
