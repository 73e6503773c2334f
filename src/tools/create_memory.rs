use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

use super::{check_types, decode_params, non_empty, params_schema, Tool, ToolContext};
use crate::client::types::Submission;
use crate::client::MemoryServiceClient;
use crate::error::ToolArgumentError;
use crate::extract::{extract_memory_content, extract_tag};

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateMemoryParams {
    #[schemars(description = "The user's unique identifier (user key)")]
    pub user_key: Option<String>,

    #[schemars(description = "The content to store")]
    pub content: Option<String>,

    #[schemars(description = "Optional tag to categorize the entry")]
    pub tag: Option<String>,

    #[schemars(description = "Optional session ID. Defaults to the current hour bucket.")]
    pub session_id: Option<String>,
}

/// Which create endpoint a [`CreateMemoryTool`] submits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Memory,
    Reminder,
}

impl SubmissionKind {
    fn tool_name(self) -> &'static str {
        match self {
            Self::Memory => "create_memory",
            Self::Reminder => "create_reminder",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Reminder => "reminder",
        }
    }
}

/// Stores a new memory (or reminder) for a user.
pub struct CreateMemoryTool {
    client: Arc<MemoryServiceClient>,
    kind: SubmissionKind,
}

impl CreateMemoryTool {
    pub fn new(client: Arc<MemoryServiceClient>, kind: SubmissionKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl Tool for CreateMemoryTool {
    fn name(&self) -> &str {
        self.kind.tool_name()
    }

    fn description(&self) -> &str {
        match self.kind {
            SubmissionKind::Memory => {
                "Create a new memory for a user. Requires the user's key and the content \
                 to remember; optionally a tag and a session ID."
            }
            SubmissionKind::Reminder => {
                "Create a reminder for a user. Requires the user's key and what to be \
                 reminded about; optionally a tag and a session ID."
            }
        }
    }

    fn parameters(&self) -> Value {
        params_schema::<CreateMemoryParams>(&["user_key", "content"])
    }

    // Required fields may come from the session or the utterance instead.
    fn validate(&self, args: &Value) -> Result<(), String> {
        check_types(&self.parameters(), args)
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> String {
        let params: CreateMemoryParams = match decode_params(self.name(), args) {
            Ok(p) => p,
            Err(e) => return format!("Error: {e}"),
        };

        let Some(user_key) = non_empty(params.user_key).or_else(|| ctx.current_user.clone())
        else {
            let err = ToolArgumentError::Missing {
                what: "User key",
                hint: "your user key or identifier",
            };
            return format!("Error: {err}");
        };
        let Some(content) =
            non_empty(params.content).or_else(|| extract_memory_content(&ctx.utterance))
        else {
            let err = ToolArgumentError::Missing {
                what: "Memory content",
                hint: "the content you want to remember",
            };
            return format!("Error: {err}");
        };
        let tag = non_empty(params.tag).or_else(|| extract_tag(&ctx.utterance));
        let session_id = non_empty(params.session_id);

        tracing::info!(
            user = %user_key,
            kind = self.kind.noun(),
            tag = ?tag,
            "creating entry"
        );
        let result = match self.kind {
            SubmissionKind::Memory => {
                self.client
                    .create_memory(&user_key, &content, tag.as_deref(), session_id.as_deref())
                    .await
            }
            SubmissionKind::Reminder => {
                self.client
                    .create_reminder(&user_key, &content, tag.as_deref(), session_id.as_deref())
                    .await
            }
        };

        match result {
            Ok(submission) => {
                render_created(self.kind, &user_key, &content, tag.as_deref(), &submission)
            }
            Err(failure) => format!("Failed to create {}: {failure}", self.kind.noun()),
        }
    }
}

pub fn render_created(
    kind: SubmissionKind,
    user_key: &str,
    content: &str,
    tag: Option<&str>,
    submission: &Submission,
) -> String {
    let noun = kind.noun();
    let mut out = format!("Successfully created {noun} for user \"{user_key}\"!\nContent: {content}\n");
    if let Some(tag) = tag {
        let _ = writeln!(out, "Tag: {tag}");
    }
    let message = if submission.message.is_empty() {
        format!("{} stored successfully", capitalize(noun))
    } else {
        submission.message.clone()
    };
    let _ = write!(
        out,
        "Process ID: {}\nMessage: {message}",
        submission.process_id.as_deref().unwrap_or("N/A")
    );
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_summary_includes_tag_and_process_id() {
        let out = render_created(
            SubmissionKind::Memory,
            "alice",
            "Went to Paris",
            Some("travel"),
            &Submission {
                message: "Queued".into(),
                process_id: Some("p-42".into()),
            },
        );
        assert_eq!(
            out,
            "Successfully created memory for user \"alice\"!\nContent: Went to Paris\nTag: travel\nProcess ID: p-42\nMessage: Queued"
        );
    }

    #[test]
    fn created_summary_uses_placeholders() {
        let out = render_created(
            SubmissionKind::Reminder,
            "bob",
            "Dentist Friday",
            None,
            &Submission::default(),
        );
        assert!(out.starts_with("Successfully created reminder for user \"bob\"!"));
        assert!(!out.contains("Tag:"));
        assert!(out.contains("Process ID: N/A"));
        assert!(out.ends_with("Message: Reminder stored successfully"));
    }

    #[test]
    fn tool_names_follow_kind() {
        assert_eq!(SubmissionKind::Memory.tool_name(), "create_memory");
        assert_eq!(SubmissionKind::Reminder.tool_name(), "create_reminder");
    }
}
