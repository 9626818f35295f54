//! Blocking QBench client.

use std::time::Duration;

use cnu_config::{QBenchCredentials, QBenchEndpoint, Secret};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{QBenchError, Result};
use crate::types::{QBenchSample, TokenResponse, WorksheetUpdate, decode_sample};

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("cn-upload-results/", env!("CARGO_PKG_VERSION"));

/// Client for the QBench REST API.
///
/// Call [`QBenchClient::authenticate`] once before any other request.
pub struct QBenchClient {
    client: Client,
    endpoint: QBenchEndpoint,
    token: Option<Secret>,
}

impl QBenchClient {
    /// Create a client for a resolved endpoint.
    pub fn new(endpoint: QBenchEndpoint) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| QBenchError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Obtain a bearer token.
    ///
    /// An API key is used as the token directly; client credentials are
    /// exchanged at the token endpoint.
    pub fn authenticate(&mut self) -> Result<()> {
        let token = match &self.endpoint.credentials {
            QBenchCredentials::ApiKey(key) => key.clone(),
            QBenchCredentials::ClientCredentials {
                client_id,
                client_secret,
            } => {
                debug!(url = %self.endpoint.token_url, "requesting QBench token");
                let response = self
                    .client
                    .post(&self.endpoint.token_url)
                    .header(ACCEPT, "application/json")
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.expose()),
                    ])
                    .send()?;
                let body = read_body(response, ResponseKind::Token)?;
                let token: TokenResponse = serde_json::from_str(&body)?;
                Secret::new(token.access_token)
            }
        };
        if token.is_empty() {
            return Err(QBenchError::Auth {
                message: "empty access token".to_string(),
            });
        }
        self.token = Some(token);
        info!(base_url = %self.endpoint.base_url, "authenticated with QBench");
        Ok(())
    }

    /// Fetch a sample and its tests.
    pub fn find_sample(&self, sample_id: &str) -> Result<QBenchSample> {
        let url = sample_url(&self.endpoint.base_url, sample_id);
        debug!(sample_id, "fetching QBench sample");
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .header(ACCEPT, "application/json")
            .query(&[("include", "tests")])
            .send()?;
        let body = read_body(response, ResponseKind::Sample { sample_id })?;
        Ok(decode_sample(&body)?)
    }

    /// Replace worksheet fields of a test and return QBench's response.
    pub fn update_worksheet(&self, test_id: u64, update: &WorksheetUpdate) -> Result<Value> {
        let url = worksheet_url(&self.endpoint.base_url, test_id);
        debug!(test_id, fields = update.data.len(), "updating QBench worksheet");
        let response = self
            .client
            .patch(&url)
            .bearer_auth(self.token()?)
            .header(ACCEPT, "application/json")
            .json(update)
            .send()?;
        let body = read_body(response, ResponseKind::Worksheet)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_ref()
            .map(Secret::expose)
            .ok_or_else(|| QBenchError::Auth {
                message: "client is not authenticated".to_string(),
            })
    }
}

/// What a response belongs to; decides how failure statuses map to errors.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ResponseKind<'a> {
    Token,
    Sample { sample_id: &'a str },
    Worksheet,
}

fn read_body(response: Response, kind: ResponseKind<'_>) -> Result<String> {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    check_status(status, body, kind)
}

/// Map a response status and body to the body or a typed error.
pub(crate) fn check_status(status: StatusCode, body: String, kind: ResponseKind<'_>) -> Result<String> {
    if status.is_success() {
        return Ok(body);
    }
    warn!(status = status.as_u16(), ?kind, "QBench request failed");
    let code = status.as_u16();
    match (kind, code) {
        (ResponseKind::Token, 400) | (_, 401 | 403) => Err(QBenchError::Auth {
            message: format!("HTTP {code}: {}", body.trim()),
        }),
        (ResponseKind::Sample { sample_id }, 404) => Err(QBenchError::NotFound {
            sample_id: sample_id.to_string(),
        }),
        _ => Err(QBenchError::Remote { status: code, body }),
    }
}

pub(crate) fn sample_url(base_url: &str, sample_id: &str) -> String {
    format!("{base_url}/api/v1/sample/{}", sample_id.trim())
}

pub(crate) fn worksheet_url(base_url: &str, test_id: u64) -> String {
    format!("{base_url}/api/v1/test/{test_id}/worksheet")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> QBenchEndpoint {
        QBenchEndpoint {
            base_url: "https://sandbox.qbench.net".to_string(),
            token_url: "https://sandbox.qbench.net/qbench/oauth2/v1/token".to_string(),
            credentials: QBenchCredentials::ApiKey(Secret::new("key")),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = QBenchClient::new(endpoint()).unwrap();
        assert!(!client.is_authenticated());
        assert_eq!(client.base_url(), "https://sandbox.qbench.net");
    }

    #[test]
    fn test_api_key_authentication_is_local() {
        let mut client = QBenchClient::new(endpoint()).unwrap();
        client.authenticate().unwrap();
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_requests_require_token() {
        let client = QBenchClient::new(endpoint()).unwrap();
        assert!(matches!(
            client.find_sample("14956"),
            Err(QBenchError::Auth { .. })
        ));
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            sample_url("https://lab.qbench.net", " 14956 "),
            "https://lab.qbench.net/api/v1/sample/14956"
        );
        assert_eq!(
            worksheet_url("https://lab.qbench.net", 501),
            "https://lab.qbench.net/api/v1/test/501/worksheet"
        );
    }

    #[test]
    fn test_status_mapping() {
        let sample = ResponseKind::Sample { sample_id: "14956" };
        assert_eq!(
            check_status(StatusCode::OK, "{}".to_string(), sample).unwrap(),
            "{}"
        );
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, String::new(), sample),
            Err(QBenchError::NotFound { ref sample_id }) if sample_id == "14956"
        ));
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, String::new(), sample),
            Err(QBenchError::Auth { .. })
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_REQUEST, "bad grant".to_string(), ResponseKind::Token),
            Err(QBenchError::Auth { .. })
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "gone".to_string(), ResponseKind::Worksheet),
            Err(QBenchError::Remote { status: 404, ref body }) if body == "gone"
        ));
        assert!(matches!(
            check_status(StatusCode::UNPROCESSABLE_ENTITY, String::new(), ResponseKind::Worksheet),
            Err(QBenchError::Remote { status: 422, .. })
        ));
    }
}
