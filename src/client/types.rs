//! Wire types for the memory service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Status string the service uses for a successful call.
pub const STATUS_SUCCESS: &str = "Success";

/// A stored memory as returned by `/api/memory/list`. Never mutated
/// client-side, only rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryRecord {
    #[serde(alias = "memory")]
    pub content: String,
    pub date: Option<String>,
    #[serde(
        rename = "transactionNumber",
        alias = "transactionId",
        alias = "transaction_number"
    )]
    pub transaction_id: Option<String>,
    /// Ordered as the service returned them.
    #[serde(alias = "tokens")]
    pub tags: Vec<String>,
    pub language: Option<String>,
}

/// Outcome of a successful create / reminder / transcript call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub message: String,
    pub process_id: Option<String>,
}

/// Service health as reported by `/api/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub message: Option<String>,
}

/// Why a memory-service call failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceFailure {
    /// Timeout, connection failure, non-2xx status, or an unreadable body.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The service answered but reported a non-success status.
    #[error("{message}")]
    Service { status: String, message: String },
}

/// Every client call normalizes to this: `Ok` is the success branch,
/// `Err` carries the failure message.
pub type ServiceResult<T> = Result<T, ServiceFailure>;

/// Response envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, rename = "processId", alias = "process_id")]
    pub process_id: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl Envelope {
    /// Split into the success envelope or a [`ServiceFailure::Service`].
    pub fn into_success(self) -> ServiceResult<Self> {
        if self.status == STATUS_SUCCESS {
            return Ok(self);
        }
        let mut message = self
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error occurred".to_string());
        if let Some(details) = &self.details {
            message.push_str(&format!("\nDetails: {details}"));
        }
        Err(ServiceFailure::Service {
            status: self.status,
            message,
        })
    }

    pub fn memories(&self) -> ServiceResult<Vec<MemoryRecord>> {
        let Some(memories) = self.data.as_ref().and_then(|d| d.get("memories")) else {
            return Ok(Vec::new());
        };
        serde_json::from_value(memories.clone())
            .map_err(|e| ServiceFailure::Transport(format!("unexpected memory list shape: {e}")))
    }

    pub fn into_submission(self) -> Submission {
        Submission {
            message: self.message.unwrap_or_default(),
            process_id: self.process_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListRequest<'a> {
    pub user_key: &'a str,
    pub tokens: &'a [String],
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateRequest<'a> {
    pub user_key: &'a str,
    pub content: &'a str,
    pub tag: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranscriptRequest<'a> {
    pub user_key: &'a str,
    pub metadata: TranscriptMetadata<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TranscriptMetadata<'a> {
    pub source: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tag: &'a str,
    pub message: &'a str,
}
