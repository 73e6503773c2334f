//! Error taxonomy.
//!
//! Only [`ConfigError`] is allowed to abort the process. Everything else is
//! turned into a value before it reaches the conversation loop: memory-service
//! failures become [`ServiceFailure`](crate::client::types::ServiceFailure),
//! tool argument problems become the tool's returned text, and provider or
//! round-limit failures become the reply of the turn.

use thiserror::Error;

/// Fatal startup errors. Raised before any client is constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key is required (set XDB_API_KEY or [service].api_key)")]
    MissingApiKey,

    #[error("LLM API key is required (set OPENAI_API_KEY or [llm].api_key)")]
    MissingLlmKey,

    #[error("{field} must be greater than zero")]
    InvalidLimit { field: &'static str },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures talking to the LLM completion provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(String),

    #[error("LLM API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed LLM response: {0}")]
    Malformed(String),
}

/// A tool call whose arguments did not match the tool's parameter schema, or
/// that is missing information the tool cannot recover.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolArgumentError {
    #[error("invalid arguments for {tool}: {reason}")]
    Invalid { tool: String, reason: String },

    #[error("{what} is required. Please provide {hint}.")]
    Missing {
        what: &'static str,
        hint: &'static str,
    },
}

/// Why a single conversation turn could not produce a model-written reply.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("tool-calling did not finish within {rounds} rounds")]
    RoundLimit { rounds: usize },
}
