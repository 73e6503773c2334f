//! Signed HTTP client for the XDB memory service.
//!
//! Every operation serializes its body once, signs those exact bytes, and
//! POSTs them with the `apikey` (and, when signing, `signature`) header.
//! Failures of any kind come back as [`ServiceFailure`] values.

pub mod signer;
pub mod types;

use chrono::{DateTime, Local, TimeZone};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;

use crate::config::ServiceConfig;
use signer::{RequestSigner, SigningMode};
use types::{
    CreateRequest, Envelope, HealthStatus, ListRequest, MemoryRecord, ServiceFailure,
    ServiceResult, Submission, TranscriptMetadata, TranscriptRequest,
};

pub const LIST_PATH: &str = "/api/memory/list";
pub const CREATE_PATH: &str = "/api/memory/create";
pub const REMINDER_PATH: &str = "/api/reminder/create";
pub const TRANSCRIPT_PATH: &str = "/api/extraction/process-summary";
pub const HEALTH_PATH: &str = "/api/health";

/// Format of the default session id: year, month, day, hour.
const SESSION_BUCKET_FORMAT: &str = "%Y%m%d%H";

/// Session id for memories created at `at`: one bucket per clock hour,
/// e.g. `2024060114`.
pub fn session_bucket<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(SESSION_BUCKET_FORMAT).to_string()
}

/// Session id for a memory created now, in local time.
pub fn default_session_id() -> String {
    session_bucket(&Local::now())
}

pub struct MemoryServiceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    signer: RequestSigner,
}

impl MemoryServiceClient {
    /// Build a client from service settings. Key problems degrade to unsigned
    /// mode; only a broken HTTP stack fails construction.
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        let signer = RequestSigner::from_source(config.key_source().as_ref());
        Self::with_signer(config, signer)
    }

    pub fn with_signer(config: &ServiceConfig, signer: RequestSigner) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        tracing::info!(
            base_url = %config.base_url,
            signed = signer.mode().is_signed(),
            "memory service client ready"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            signer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn signing_mode(&self) -> &SigningMode {
        self.signer.mode()
    }

    /// List a user's memories, optionally filtered by tags and a search query.
    pub async fn list_memories(
        &self,
        user_key: &str,
        tags: Option<&[String]>,
        query: Option<&str>,
    ) -> ServiceResult<Vec<MemoryRecord>> {
        let body = ListRequest {
            user_key,
            tokens: tags.unwrap_or(&[]),
            query: query.unwrap_or(""),
        };
        let envelope = self.post(LIST_PATH, &body).await?;
        envelope.memories()
    }

    /// Create a memory. Without a session id the memory lands in the current
    /// hour's bucket (see [`session_bucket`]).
    pub async fn create_memory(
        &self,
        user_key: &str,
        content: &str,
        tag: Option<&str>,
        session_id: Option<&str>,
    ) -> ServiceResult<Submission> {
        self.submit(CREATE_PATH, user_key, content, tag, session_id)
            .await
    }

    /// Create a reminder. Same body and session defaults as [`create_memory`](Self::create_memory).
    pub async fn create_reminder(
        &self,
        user_key: &str,
        content: &str,
        tag: Option<&str>,
        session_id: Option<&str>,
    ) -> ServiceResult<Submission> {
        self.submit(REMINDER_PATH, user_key, content, tag, session_id)
            .await
    }

    /// Submit a transcript for server-side summary extraction.
    pub async fn process_transcript(
        &self,
        user_key: &str,
        transcript: &str,
        tag: &str,
    ) -> ServiceResult<Submission> {
        let body = TranscriptRequest {
            user_key,
            metadata: TranscriptMetadata {
                source: "MANUAL",
                kind: "SUMMARY",
                tag,
                message: transcript,
            },
        };
        let envelope = self.post(TRANSCRIPT_PATH, &body).await?;
        Ok(envelope.into_submission())
    }

    pub async fn health_check(&self) -> ServiceResult<HealthStatus> {
        let envelope = self.post(HEALTH_PATH, &serde_json::json!({})).await?;
        Ok(HealthStatus {
            status: envelope.status,
            message: envelope.message,
        })
    }

    async fn submit(
        &self,
        path: &str,
        user_key: &str,
        content: &str,
        tag: Option<&str>,
        session_id: Option<&str>,
    ) -> ServiceResult<Submission> {
        let session_id = match session_id.filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => default_session_id(),
        };
        let body = CreateRequest {
            user_key,
            content,
            tag: tag.unwrap_or(""),
            session_id: &session_id,
        };
        let envelope = self.post(path, &body).await?;
        Ok(envelope.into_submission())
    }

    /// Serialize, sign, send, and normalize the reply. Non-"Success" statuses
    /// become [`ServiceFailure::Service`]; everything else that goes wrong is
    /// [`ServiceFailure::Transport`].
    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ServiceResult<Envelope> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| ServiceFailure::Transport(format!("failed to encode request: {e}")))?;
        let headers = self.headers(&payload)?;
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(%url, bytes = payload.len(), "memory service request");

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .body(payload)
            .send()
            .await
            .map_err(|e| transport_failure(path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(transport_failure(path, format!("HTTP {status}: {text}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_failure(path, format!("error reading response: {e}")))?;
        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| transport_failure(path, format!("invalid response body: {e}")))?;

        match envelope.into_success() {
            Ok(envelope) => {
                tracing::info!(path, "memory service call succeeded");
                Ok(envelope)
            }
            Err(failure) => {
                tracing::info!(path, %failure, "memory service reported failure");
                Err(failure)
            }
        }
    }

    fn headers(&self, payload: &[u8]) -> ServiceResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ServiceFailure::Transport(format!("invalid API key header: {e}")))?,
        );
        if let Some(signature) = self.signer.sign(payload) {
            // base64 is always a valid header value
            if let Ok(value) = HeaderValue::from_str(&signature) {
                headers.insert("signature", value);
            }
        }
        Ok(headers)
    }
}

fn transport_failure(path: &str, message: String) -> ServiceFailure {
    tracing::warn!(path, error = %message, "memory service transport failure");
    ServiceFailure::Transport(message)
}
