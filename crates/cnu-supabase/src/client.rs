//! Blocking Supabase client (GoTrue password sign-in and PostgREST insert).

use std::time::Duration;

use cnu_config::SupabaseSettings;
use cnu_model::UploadRecord;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, SupabaseError};
use crate::session::Session;

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for one Supabase project.
pub struct SupabaseClient {
    client: Client,
    settings: SupabaseSettings,
}

impl SupabaseClient {
    pub fn new(settings: &SupabaseSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SupabaseError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    pub fn table(&self) -> &str {
        &self.settings.table
    }

    /// Sign in with email and password.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = token_url(&self.settings.url);
        debug!(email, "signing in to Supabase");
        let response = self
            .client
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", self.settings.anon_key.expose())
            .header(ACCEPT, "application/json")
            .json(&PasswordGrant {
                email: email.trim(),
                password,
            })
            .send()?;

        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        check_sign_in_status(status, &body)?;
        let session: Session =
            serde_json::from_str(&body).map_err(|e| SupabaseError::Decode(e.to_string()))?;
        info!(user_id = %session.user.id, "signed in to Supabase");
        Ok(session)
    }

    /// Insert one audit row.
    ///
    /// Uses the user session when present, otherwise the service-role key.
    pub fn insert_upload_record(
        &self,
        record: &UploadRecord,
        session: Option<&Session>,
    ) -> Result<()> {
        let url = table_url(&self.settings.url, &self.settings.table);
        debug!(run_id = %record.run_id, table = %self.settings.table, "inserting upload record");
        let response = self
            .client
            .post(&url)
            .header("apikey", self.settings.anon_key.expose())
            .bearer_auth(insert_bearer(&self.settings, session))
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=minimal")
            .json(record)
            .send()?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().unwrap_or_default();
            warn!(status, run_id = %record.run_id, "upload record rejected");
            return Err(SupabaseError::Persistence { status, body });
        }
        info!(run_id = %record.run_id, "stored upload record");
        Ok(())
    }
}

pub(crate) fn token_url(base_url: &str) -> String {
    format!("{}/auth/v1/token", base_url.trim_end_matches('/'))
}

pub(crate) fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table.trim())
}

pub(crate) fn insert_bearer<'a>(settings: &'a SupabaseSettings, session: Option<&'a Session>) -> &'a str {
    match (session, &settings.service_role_key) {
        (Some(session), _) => &session.access_token,
        (None, Some(key)) if !key.is_empty() => key.expose(),
        _ => settings.anon_key.expose(),
    }
}

pub(crate) fn check_sign_in_status(status: u16, body: &str) -> Result<()> {
    match status {
        200..=299 => Ok(()),
        400 | 401 | 403 => Err(SupabaseError::Auth {
            message: error_message(body),
        }),
        _ => Err(SupabaseError::Network(format!(
            "Supabase returned HTTP {status}: {}",
            error_message(body)
        ))),
    }
}

/// Pull the human-readable message out of a GoTrue error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
