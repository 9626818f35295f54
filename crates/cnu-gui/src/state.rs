//! Application state.
//!
//! Views read and edit this struct; worker results are folded in through
//! [`AppState::apply`]. Nothing here touches egui, so the transitions are
//! tested directly.

use std::path::PathBuf;

use cnu_config::{Environment, Settings};
use cnu_ingest::ParseOptions;
use cnu_model::WorkbookExtraction;
use cnu_supabase::Session;
use cnu_workflow::{PersistenceOutcome, Progress, RunReport, RunStatus, UploadOptions};

use crate::worker::{UploadJob, WorkerMessage};

/// Current screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum View {
    #[default]
    Login,
    Upload,
}

/// Login form.
#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub busy: bool,
}

impl LoginForm {
    pub fn can_submit(&self) -> bool {
        !self.busy && !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

/// Severity of the final banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Error,
}

/// Message shown after a run or a failed parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub tone: Tone,
    pub text: String,
}

/// Selected workbook, its preview and the run over it.
#[derive(Debug, Default)]
pub struct UploadState {
    pub path: Option<PathBuf>,
    pub extraction: Option<WorkbookExtraction>,
    pub parsing: bool,
    /// An upload is in flight; the overlay is shown and Process is disabled.
    pub running: bool,
    pub progress: Option<Progress>,
    pub banner: Option<Banner>,
    pub report: Option<RunReport>,
}

/// Top-level application state.
pub struct AppState {
    pub settings: Settings,
    /// Why settings could not be loaded, shown on the login screen.
    pub settings_error: Option<String>,
    pub view: View,
    pub login: LoginForm,
    pub session: Option<Session>,
    pub upload: UploadState,
    pub dry_run: bool,
    pub instrument: String,
}

impl AppState {
    pub fn new(settings: Settings, settings_error: Option<String>) -> Self {
        let dry_run = settings.upload.dry_run;
        Self {
            settings,
            settings_error,
            view: View::default(),
            login: LoginForm::default(),
            session: None,
            upload: UploadState::default(),
            dry_run,
            instrument: String::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.settings.environment
    }

    /// Mark the login form busy; returns the credentials to send.
    pub fn begin_sign_in(&mut self) -> Option<(String, String)> {
        if !self.login.can_submit() {
            return None;
        }
        self.login.busy = true;
        self.login.error = None;
        Some((self.login.email.trim().to_string(), self.login.password.clone()))
    }

    pub fn sign_out(&mut self) {
        self.session = None;
        self.login.password.clear();
        self.view = View::Login;
    }

    pub fn parse_options(&self) -> ParseOptions {
        let instrument = self.instrument.trim();
        ParseOptions {
            instrument: (!instrument.is_empty()).then(|| instrument.to_string()),
            strict_numeric: self.settings.upload.strict_numeric,
        }
    }

    /// Forget the current workbook and start parsing `path`.
    pub fn begin_parse(&mut self, path: PathBuf) {
        self.upload = UploadState {
            path: Some(path),
            parsing: true,
            ..UploadState::default()
        };
    }

    pub fn can_process(&self) -> bool {
        self.session.is_some()
            && !self.upload.running
            && !self.upload.parsing
            && self
                .upload
                .extraction
                .as_ref()
                .is_some_and(|extraction| !extraction.samples.is_empty())
    }

    /// Start a run over the previewed workbook.
    ///
    /// Returns `None` when a run cannot start, including while one is already
    /// in flight.
    pub fn begin_upload(&mut self) -> Option<UploadJob> {
        if !self.can_process() {
            return None;
        }
        let extraction = self.upload.extraction.clone()?;
        let created_by = self
            .session
            .as_ref()
            .map(|session| session.display_name().to_string())
            .unwrap_or_default();
        self.upload.running = true;
        self.upload.progress = None;
        self.upload.banner = None;
        self.upload.report = None;
        Some(UploadJob {
            settings: self.settings.clone(),
            session: self.session.clone(),
            extraction,
            options: UploadOptions {
                environment: self.settings.environment,
                dry_run: self.dry_run,
                skip_processed_tests: self.settings.upload.skip_processed_tests,
                created_by,
                notes: None,
            },
        })
    }

    /// Fold a worker message into the state.
    pub fn apply(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::SignedIn(Ok(session)) => {
                tracing::info!(user = session.display_name(), "signed in");
                self.login.busy = false;
                self.login.password.clear();
                self.session = Some(session);
                self.view = View::Upload;
            }
            WorkerMessage::SignedIn(Err(error)) => {
                self.login.busy = false;
                self.login.error = Some(error);
            }
            WorkerMessage::Parsed { path, result } => {
                // A newer selection replaced this one.
                if self.upload.path.as_ref() != Some(&path) {
                    return;
                }
                self.upload.parsing = false;
                match result {
                    Ok(extraction) => self.upload.extraction = Some(extraction),
                    Err(error) => {
                        self.upload.banner = Some(Banner {
                            tone: Tone::Error,
                            text: error,
                        });
                    }
                }
            }
            WorkerMessage::Progress(progress) => self.upload.progress = Some(progress),
            WorkerMessage::Finished(result) => {
                self.upload.running = false;
                self.upload.progress = None;
                match result {
                    Ok(report) => {
                        self.upload.banner = Some(Banner {
                            tone: report_tone(&report),
                            text: report.user_message(),
                        });
                        self.upload.report = Some(*report);
                    }
                    Err(error) => {
                        self.upload.banner = Some(Banner {
                            tone: Tone::Error,
                            text: error,
                        });
                    }
                }
            }
        }
    }
}

fn report_tone(report: &RunReport) -> Tone {
    match (report.status, &report.persistence) {
        (_, PersistenceOutcome::Failed(_)) => Tone::Warning,
        (RunStatus::Done, _) => Tone::Success,
        (RunStatus::PartiallySucceeded, _) => Tone::Warning,
        (RunStatus::Failed, _) => Tone::Error,
    }
}
