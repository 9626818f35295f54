//! Seams between the workflow and the outside world.
//!
//! The workflow only sees these traits; the QBench and Supabase clients
//! implement them here and tests provide in-memory versions.

use cnu_config::Settings;
use cnu_model::UploadRecord;
use cnu_qbench::{QBenchClient, QBenchError, QBenchSample, WorksheetUpdate};
use cnu_supabase::{Session, SupabaseClient, SupabaseError};
use serde_json::Value;

use crate::error::{Result, RunError};

/// Looks up samples with their tests.
pub trait SampleSource {
    fn find_sample(&self, sample_id: &str) -> std::result::Result<QBenchSample, QBenchError>;
}

/// Writes worksheet fields of a test.
pub trait WorksheetSink {
    fn update_worksheet(
        &self,
        test_id: u64,
        update: &WorksheetUpdate,
    ) -> std::result::Result<Value, QBenchError>;
}

/// Stores the audit row of a run.
pub trait AuditStore {
    fn insert_upload_record(&self, record: &UploadRecord) -> std::result::Result<(), SupabaseError>;
}

impl SampleSource for QBenchClient {
    fn find_sample(&self, sample_id: &str) -> std::result::Result<QBenchSample, QBenchError> {
        QBenchClient::find_sample(self, sample_id)
    }
}

impl WorksheetSink for QBenchClient {
    fn update_worksheet(
        &self,
        test_id: u64,
        update: &WorksheetUpdate,
    ) -> std::result::Result<Value, QBenchError> {
        QBenchClient::update_worksheet(self, test_id, update)
    }
}

/// Supabase audit table, written with the signed-in user's session when
/// there is one.
pub struct SupabaseAudit {
    client: SupabaseClient,
    session: Option<Session>,
}

impl SupabaseAudit {
    pub fn new(client: SupabaseClient, session: Option<Session>) -> Self {
        Self { client, session }
    }
}

impl AuditStore for SupabaseAudit {
    fn insert_upload_record(&self, record: &UploadRecord) -> std::result::Result<(), SupabaseError> {
        self.client
            .insert_upload_record(record, self.session.as_ref())
    }
}

/// Accepts and drops every record; stands in for Supabase on dry runs.
pub struct NoAudit;

impl AuditStore for NoAudit {
    fn insert_upload_record(&self, _record: &UploadRecord) -> std::result::Result<(), SupabaseError> {
        Ok(())
    }
}

/// Resolve the QBench endpoint from settings and authenticate.
pub fn connect_qbench(settings: &Settings) -> Result<QBenchClient> {
    let endpoint = settings.qbench_endpoint()?;
    let mut client = QBenchClient::new(endpoint).map_err(RunError::Connect)?;
    client.authenticate().map_err(RunError::Connect)?;
    Ok(client)
}

/// Build the audit store from settings.
pub fn connect_audit(settings: &Settings, session: Option<Session>) -> Result<SupabaseAudit> {
    settings.validate_supabase()?;
    let client = SupabaseClient::new(&settings.supabase).map_err(RunError::Audit)?;
    Ok(SupabaseAudit::new(client, session))
}
