//! Background work for the desktop app.
//!
//! Sign-in, parsing and uploads each run on their own thread and report back
//! through a one-way channel. The `notify` callback wakes the UI after every
//! message; in the app it is `ctx.request_repaint()`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use cnu_config::Settings;
use cnu_ingest::{ParseOptions, parse_workbook};
use cnu_model::WorkbookExtraction;
use cnu_supabase::{Session, SupabaseClient};
use cnu_workflow::{
    NoAudit, Progress, RunReport, Services, UploadOptions, connect_audit, connect_qbench,
    publish_extraction,
};

/// Wakes the UI thread.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Messages from a worker thread to the UI.
#[derive(Debug)]
pub enum WorkerMessage {
    SignedIn(Result<Session, String>),
    Parsed {
        path: PathBuf,
        result: Result<WorkbookExtraction, String>,
    },
    Progress(Progress),
    Finished(Result<Box<RunReport>, String>),
}

/// Everything an upload thread needs, owned.
pub struct UploadJob {
    pub settings: Settings,
    pub session: Option<Session>,
    pub extraction: WorkbookExtraction,
    pub options: UploadOptions,
}

pub fn spawn_sign_in(
    settings: Settings,
    email: String,
    password: String,
    tx: Sender<WorkerMessage>,
    notify: Notify,
) {
    thread::spawn(move || {
        let result = sign_in(&settings, &email, &password);
        let _ = tx.send(WorkerMessage::SignedIn(result));
        notify();
    });
}

fn sign_in(settings: &Settings, email: &str, password: &str) -> Result<Session, String> {
    settings
        .validate_supabase()
        .map_err(|err| err.user_message())?;
    let client = SupabaseClient::new(&settings.supabase).map_err(|err| err.user_message())?;
    client
        .sign_in(email, password)
        .map_err(|err| err.user_message())
}

pub fn spawn_parse(
    path: PathBuf,
    options: ParseOptions,
    tx: Sender<WorkerMessage>,
    notify: Notify,
) {
    thread::spawn(move || {
        let result = parse_workbook(&path, &options).map_err(|err| err.user_message());
        let _ = tx.send(WorkerMessage::Parsed { path, result });
        notify();
    });
}

pub fn spawn_upload(job: UploadJob, tx: Sender<WorkerMessage>, notify: Notify) {
    thread::spawn(move || {
        let progress = {
            let tx = tx.clone();
            let notify = Arc::clone(&notify);
            move |update: Progress| {
                let _ = tx.send(WorkerMessage::Progress(update));
                notify();
            }
        };
        let result = run_job(job, &progress).map(Box::new);
        let _ = tx.send(WorkerMessage::Finished(result));
        notify();
    });
}

fn run_job(job: UploadJob, progress: &dyn cnu_workflow::ProgressSink) -> Result<RunReport, String> {
    let UploadJob {
        settings,
        session,
        extraction,
        options,
    } = job;
    let qbench = connect_qbench(&settings).map_err(|err| err.user_message())?;
    let result = if options.dry_run {
        let services = Services {
            samples: &qbench,
            worksheets: &qbench,
            audit: &NoAudit,
        };
        publish_extraction(extraction, &options, &services, progress)
    } else {
        let audit = connect_audit(&settings, session).map_err(|err| err.user_message())?;
        let services = Services {
            samples: &qbench,
            worksheets: &qbench,
            audit: &audit,
        };
        publish_extraction(extraction, &options, &services, progress)
    };
    result.map_err(|err| err.user_message())
}
