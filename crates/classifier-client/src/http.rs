use std::time::Duration;

use async_trait::async_trait;

use crate::types::{ClassifierResult, ClassifyRequest};
use crate::{ClassifierClient, ClassifierError, Result};

const CLASSIFY_PATH: &str = "/v1/classify";

// ─── HttpClassifierClient ─────────────────────────────────────────────────

/// `ClassifierClient` backed by a JSON-over-HTTP research service.
///
/// Each call POSTs a [`ClassifyRequest`] to `<endpoint>/v1/classify` and
/// decodes a [`ClassifierResult`]. Retryable failures (transport errors, 429,
/// 5xx) are retried up to `retries` extra times with a linear backoff.
#[derive(Debug, Clone)]
pub struct HttpClassifierClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    retries: u32,
    backoff: Duration,
}

impl HttpClassifierClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let trimmed = endpoint.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ClassifierError::InvalidEndpoint(endpoint));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: trimmed,
            api_key: None,
            retries: 2,
            backoff: Duration::from_millis(250),
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Per-request transport timeout, independent of the monitor's own
    /// timeout around the whole call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request, retrying retryable failures.
    pub async fn request(&self, req: &ClassifyRequest) -> Result<ClassifierResult> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send_once(req).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt <= self.retries => {
                    tracing::debug!(
                        resource = %req.name,
                        attempt,
                        "classifier request failed, retrying: {e}"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, req: &ClassifyRequest) -> Result<ClassifierResult> {
        let url = format!("{}{}", self.endpoint, CLASSIFY_PATH);
        let mut builder = self.http.post(&url).json(req);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(ClassifierError::Decode)
    }
}

#[async_trait]
impl ClassifierClient for HttpClassifierClient {
    async fn classify(
        &self,
        name: &str,
        version: &str,
        ecosystem: &str,
    ) -> Option<ClassifierResult> {
        let req = ClassifyRequest {
            name: name.to_string(),
            version: version.to_string(),
            ecosystem: ecosystem.to_string(),
        };
        match self.request(&req).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(resource = %name, "classifier unavailable: {e}");
                None
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
