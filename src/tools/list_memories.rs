use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

use super::{check_types, decode_params, non_empty, params_schema, Tool, ToolContext};
use crate::client::types::MemoryRecord;
use crate::client::MemoryServiceClient;
use crate::error::ToolArgumentError;
use crate::extract::extract_search_query;

pub const NAME: &str = "list_memories";

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListMemoriesParams {
    #[schemars(description = "The user's unique identifier (user key)")]
    pub user_key: Option<String>,

    #[schemars(description = "Optional tags to filter memories by")]
    pub tokens: Option<Vec<String>>,

    #[schemars(description = "Optional text to search for within memory content")]
    pub query: Option<String>,
}

/// Lists a user's stored memories through the memory service.
pub struct ListMemoriesTool {
    client: Arc<MemoryServiceClient>,
}

impl ListMemoriesTool {
    pub fn new(client: Arc<MemoryServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListMemoriesTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "List memories for a user. Requires the user's key; optionally filter by \
         tags or search for text within memory content."
    }

    fn parameters(&self) -> Value {
        params_schema::<ListMemoriesParams>(&["user_key"])
    }

    // Required fields may come from the session or the utterance instead.
    fn validate(&self, args: &Value) -> Result<(), String> {
        check_types(&self.parameters(), args)
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> String {
        let params: ListMemoriesParams = match decode_params(NAME, args) {
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
        let query = non_empty(params.query).or_else(|| extract_search_query(&ctx.utterance));
        let tags = params.tokens.filter(|t| !t.is_empty());

        tracing::info!(user = %user_key, query = ?query, "listing memories");
        match self
            .client
            .list_memories(&user_key, tags.as_deref(), query.as_deref())
            .await
        {
            Ok(memories) => render_memories(&user_key, query.as_deref(), &memories),
            Err(failure) => format!("Error listing memories: {failure}"),
        }
    }
}

/// Human-readable listing handed back to the model.
pub fn render_memories(user_key: &str, query: Option<&str>, memories: &[MemoryRecord]) -> String {
    if memories.is_empty() {
        let mut out = format!("No memories found for user \"{user_key}\"");
        if let Some(q) = query {
            let _ = write!(out, " matching \"{q}\"");
        }
        out.push('.');
        return out;
    }

    let mut out = format!(
        "Found {} memor{} for user \"{user_key}\":\n",
        memories.len(),
        if memories.len() == 1 { "y" } else { "ies" }
    );
    for (i, memory) in memories.iter().enumerate() {
        let tags = if memory.tags.is_empty() {
            "None".to_string()
        } else {
            memory.tags.join(", ")
        };
        let _ = write!(
            out,
            "\nMemory {}:\n  Content: {}\n  Date: {}\n  Transaction: {}\n  Tags: {}\n  Language: {}\n",
            i + 1,
            memory.content,
            memory.date.as_deref().unwrap_or("N/A"),
            memory.transaction_id.as_deref().unwrap_or("N/A"),
            tags,
            memory.language.as_deref().unwrap_or("Not specified"),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str, tags: &[&str]) -> MemoryRecord {
        MemoryRecord {
            content: content.into(),
            date: Some("2024-01-15".into()),
            transaction_id: Some("tx-1".into()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            language: None,
        }
    }

    #[test]
    fn empty_listing_mentions_user_and_query() {
        assert_eq!(
            render_memories("alice", None, &[]),
            "No memories found for user \"alice\"."
        );
        assert_eq!(
            render_memories("alice", Some("paris"), &[]),
            "No memories found for user \"alice\" matching \"paris\"."
        );
    }

    #[test]
    fn listing_renders_each_field_with_placeholders() {
        let out = render_memories(
            "alice",
            None,
            &[record("Went to Paris", &["travel", "2024"]), record("Bought milk", &[])],
        );
        assert!(out.starts_with("Found 2 memories for user \"alice\":"));
        assert!(out.contains("Memory 1:\n  Content: Went to Paris"));
        assert!(out.contains("Tags: travel, 2024"));
        assert!(out.contains("Memory 2:\n  Content: Bought milk"));
        assert!(out.contains("Tags: None"));
        assert!(out.contains("Language: Not specified"));
    }

    #[test]
    fn single_memory_is_singular() {
        let out = render_memories("bob", None, &[record("x", &[])]);
        assert!(out.starts_with("Found 1 memory for user \"bob\":"));
    }

    #[test]
    fn params_accept_partial_arguments() {
        let params: ListMemoriesParams =
            decode_params(NAME, serde_json::json!({"query": "rust"})).unwrap();
        assert_eq!(params.user_key, None);
        assert_eq!(params.query.as_deref(), Some("rust"));
    }

    #[test]
    fn params_reject_wrong_types() {
        let err = decode_params::<ListMemoriesParams>(NAME, serde_json::json!({"tokens": "work"}))
            .unwrap_err();
        assert!(matches!(err, ToolArgumentError::Invalid { .. }));
    }
}
