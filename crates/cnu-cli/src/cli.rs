//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cnu",
    version,
    about = "Upload CN lab results from Excel to QBench",
    long_about = "Upload cannabinoid (CN) lab results from an instrument export workbook.\n\n\
                  Values are written to the matching QBench CN/HO worksheets and one audit\n\
                  record per run is stored in Supabase."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Settings file (default: settings.toml in the platform config folder).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a workbook and publish its values to QBench.
    Upload(UploadArgs),

    /// Parse a workbook and print what would be uploaded.
    Preview(PreviewArgs),

    /// List the compounds and the worksheet keys written for them.
    Compounds,
}

#[derive(Parser)]
pub struct UploadArgs {
    /// Results workbook (.xlsx).
    #[arg(value_name = "WORKBOOK")]
    pub workbook: PathBuf,

    /// Target QBench environment (overrides CNU_ENVIRONMENT).
    #[arg(long = "env", value_enum)]
    pub environment: Option<EnvironmentArg>,

    /// Plan and report without writing to QBench or Supabase.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Overwrite worksheets that already hold values.
    #[arg(long = "overwrite-processed")]
    pub overwrite_processed: bool,

    /// Instrument name stored on the run (overrides the sheet value).
    #[arg(long = "instrument", value_name = "NAME")]
    pub instrument: Option<String>,

    /// Fail on text in numeric cells instead of reading it as missing.
    #[arg(long = "strict-numeric")]
    pub strict_numeric: bool,

    /// Recorded as the author of the audit record (default: current user).
    #[arg(long = "created-by", value_name = "EMAIL")]
    pub created_by: Option<String>,

    /// Free-text note stored with the audit record.
    #[arg(long = "notes", value_name = "TEXT")]
    pub notes: Option<String>,
}

#[derive(Parser)]
pub struct PreviewArgs {
    /// Results workbook (.xlsx).
    #[arg(value_name = "WORKBOOK")]
    pub workbook: PathBuf,

    /// Instrument name (overrides the sheet value).
    #[arg(long = "instrument", value_name = "NAME")]
    pub instrument: Option<String>,

    /// Fail on text in numeric cells instead of reading it as missing.
    #[arg(long = "strict-numeric")]
    pub strict_numeric: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EnvironmentArg {
    Sandbox,
    Production,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
