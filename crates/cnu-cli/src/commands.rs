use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span, warn};

use cnu_config::{Environment, Settings, load_settings};
use cnu_ingest::{ParseOptions, parse_workbook};
use cnu_model::WorkbookExtraction;
use cnu_workflow::{
    NoAudit, Progress, RunReport, Services, UploadOptions, connect_audit, connect_qbench,
    run_upload,
};

use crate::cli::{EnvironmentArg, PreviewArgs, UploadArgs};

pub fn run_compounds() {
    println!("{}", cnu_cli::summary::compounds_table());
}

pub fn run_preview(args: &PreviewArgs, config: Option<&Path>) -> Result<WorkbookExtraction> {
    let settings = load_settings(config).context("load settings")?;
    let options = ParseOptions {
        instrument: args.instrument.clone(),
        strict_numeric: args.strict_numeric || settings.upload.strict_numeric,
    };
    parse_workbook(&args.workbook, &options)
        .map_err(|err| anyhow!(err.user_message()))
        .with_context(|| format!("parse {}", args.workbook.display()))
}

pub fn run_upload_command(args: &UploadArgs, config: Option<&Path>) -> Result<RunReport> {
    let mut settings = load_settings(config).context("load settings")?;
    apply_overrides(&mut settings, args);
    let span = info_span!("upload", environment = %settings.environment);
    let _guard = span.enter();

    let parse_options = ParseOptions {
        instrument: args.instrument.clone(),
        strict_numeric: settings.upload.strict_numeric,
    };
    let options = UploadOptions {
        environment: settings.environment,
        dry_run: settings.upload.dry_run,
        skip_processed_tests: settings.upload.skip_processed_tests,
        created_by: created_by(args),
        notes: args.notes.clone(),
    };

    let qbench = connect_qbench(&settings).map_err(|err| anyhow!(err.user_message()))?;
    info!(base_url = qbench.base_url(), "connected to QBench");

    let progress = |update: Progress| info!(stage = %update.stage, "{}", update.message);
    let report = if options.dry_run {
        let services = Services {
            samples: &qbench,
            worksheets: &qbench,
            audit: &NoAudit,
        };
        run_upload(&args.workbook, &parse_options, &options, &services, &progress)
    } else {
        let audit = connect_audit(&settings, None).map_err(|err| anyhow!(err.user_message()))?;
        let services = Services {
            samples: &qbench,
            worksheets: &qbench,
            audit: &audit,
        };
        run_upload(&args.workbook, &parse_options, &options, &services, &progress)
    };
    report.map_err(|err| anyhow!(err.user_message()))
}

fn apply_overrides(settings: &mut Settings, args: &UploadArgs) {
    if let Some(environment) = args.environment {
        settings.environment = match environment {
            EnvironmentArg::Sandbox => Environment::Sandbox,
            EnvironmentArg::Production => Environment::Production,
        };
    }
    settings.upload.dry_run |= args.dry_run;
    settings.upload.strict_numeric |= args.strict_numeric;
    if args.overwrite_processed {
        settings.upload.skip_processed_tests = false;
    }
}

fn created_by(args: &UploadArgs) -> String {
    if let Some(author) = args.created_by.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        return author.to_string();
    }
    match std::env::var("USER").or_else(|_| std::env::var("USERNAME")) {
        Ok(user) if !user.trim().is_empty() => user,
        _ => {
            warn!("no --created-by and no USER variable; recording as 'cnu'");
            "cnu".to_string()
        }
    }
}
