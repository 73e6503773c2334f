//! Conversational agent for the XDB memory service.
//!
//! An LLM reads and writes a user's memories through signed HTTP calls,
//! using a bounded tool-calling loop. When the model leaves out structured
//! arguments (who the user is, what to store, what to search for), regex
//! heuristics recover them from the user's own words.
//!
//! | Layer | Role |
//! |-------|------|
//! | [`client`] | Signed POSTs to the memory service; every failure is a value |
//! | [`tools`] | Schema-described operations the model may call |
//! | [`agent`] | Chat history, user session, and the bounded tool loop |
//! | [`extract`] | User key / content / tag / query heuristics |
//! | [`llm`] | Chat-completion provider seam |
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`error`]: Error taxonomy; only configuration errors abort the process
//! - [`transcript`]: Transcript files for server-side summary extraction

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod tools;
pub mod transcript;
