use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;
use tracing::{info, warn};

use crate::contract::{
    parse_task_response, truncate_chars, HealthResponse, SpecialistHealth, SpecialistResult,
    TaskRequest,
};

const ERROR_BODY_EXCERPT_CHARS: usize = 200;
const LOG_TASK_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone)]
/// Where one specialist lives and how long to wait for it.
pub struct SpecialistConfig {
    pub key: String,
    pub display_name: String,
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub auth_token: Option<String>,
}

impl SpecialistConfig {
    pub fn new(key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            display_name: default_display_name(&key),
            key,
            base_url: base_url.into(),
            request_timeout_ms: 120_000,
            auth_token: None,
        }
    }
}

fn default_display_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => format!("{}{} Agent", first.to_uppercase(), chars.as_str()),
        None => "Agent".to_string(),
    }
}

#[derive(Debug, Error)]
/// Failures building a specialist client. Invocations never fail this way.
pub enum SpecialistError {
    #[error("invalid specialist base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("invalid specialist auth header: {0}")]
    InvalidAuthHeader(String),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
/// A downstream specialist reachable through the task contract.
///
/// `invoke` is infallible: transport failures, timeouts and error envelopes
/// all come back as a [`SpecialistResult`] with `is_error` set.
pub trait Specialist: Send + Sync {
    fn key(&self) -> &str;

    fn display_name(&self) -> &str;

    async fn invoke(&self, task: &str, context: &str) -> SpecialistResult;

    async fn health(&self) -> SpecialistHealth {
        SpecialistHealth {
            key: self.key().to_string(),
            healthy: false,
            agent: None,
            detail: Some("health probe not supported".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
/// [`Specialist`] over HTTP. Single attempt per call, no retries.
pub struct HttpSpecialistClient {
    client: reqwest::Client,
    config: SpecialistConfig,
}

impl HttpSpecialistClient {
    pub fn new(config: SpecialistConfig) -> Result<Self, SpecialistError> {
        let base = config.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(SpecialistError::InvalidBaseUrl(config.base_url.clone()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = config
            .auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| SpecialistError::InvalidAuthHeader(e.to_string()))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SpecialistConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim().trim_end_matches('/'))
    }

    fn describe_transport_error(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!(
                "Failed to reach {}: timed out after {}ms",
                self.config.display_name, self.config.request_timeout_ms
            )
        } else {
            format!("Failed to reach {}: {error}", self.config.display_name)
        }
    }
}

#[async_trait]
impl Specialist for HttpSpecialistClient {
    fn key(&self) -> &str {
        &self.config.key
    }

    fn display_name(&self) -> &str {
        &self.config.display_name
    }

    async fn invoke(&self, task: &str, context: &str) -> SpecialistResult {
        let key = self.config.key.as_str();
        info!(
            specialist = key,
            "sending task to {}: {}...",
            self.config.display_name,
            truncate_chars(task, LOG_TASK_EXCERPT_CHARS)
        );

        let response = self
            .client
            .post(self.endpoint("/task"))
            .json(&TaskRequest::new(task, context))
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(error) => {
                let description = self.describe_transport_error(&error);
                warn!(specialist = key, "{description}");
                return SpecialistResult::error(key, description);
            }
        };

        let status = response.status();
        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(error) => {
                let description = self.describe_transport_error(&error);
                warn!(specialist = key, "{description}");
                return SpecialistResult::error(key, description);
            }
        };

        if !status.is_success() {
            warn!(
                specialist = key,
                status = status.as_u16(),
                "specialist returned non-success status"
            );
            return SpecialistResult::error(
                key,
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    truncate_chars(&raw, ERROR_BODY_EXCERPT_CHARS)
                ),
            );
        }

        match parse_task_response(&raw) {
            Ok(envelope) => {
                info!(
                    specialist = key,
                    status = envelope.status.as_str(),
                    "{} completed",
                    self.config.display_name
                );
                SpecialistResult::from_task_response(key, envelope)
            }
            Err(error) => {
                warn!(specialist = key, "specialist returned malformed envelope: {error}");
                SpecialistResult::error(
                    key,
                    format!(
                        "Invalid response from {}: {error}",
                        self.config.display_name
                    ),
                )
            }
        }
    }

    async fn health(&self) -> SpecialistHealth {
        let key = self.config.key.clone();
        let unhealthy = |detail: String| SpecialistHealth {
            key: key.clone(),
            healthy: false,
            agent: None,
            detail: Some(detail),
        };

        let response = match self.client.get(self.endpoint("/health")).send().await {
            Ok(response) => response,
            Err(error) => return unhealthy(self.describe_transport_error(&error)),
        };
        let status = response.status();
        if !status.is_success() {
            return unhealthy(format!("HTTP {}", status.as_u16()));
        }
        let body = match response.json::<HealthResponse>().await {
            Ok(body) => body,
            Err(error) => return unhealthy(format!("invalid health payload: {error}")),
        };
        if body.status != "healthy" {
            return SpecialistHealth {
                key: key.clone(),
                healthy: false,
                agent: body.agent,
                detail: Some(format!("reported status '{}'", body.status)),
            };
        }

        SpecialistHealth {
            key: key.clone(),
            healthy: true,
            agent: body.agent,
            detail: None,
        }
    }
}
