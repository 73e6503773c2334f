//! Conversation orchestration.
//!
//! [`MemoryAgent`] owns one conversation: the chat history (system turn
//! first), the [`UserSession`], and the tool registry. Each call to
//! [`MemoryAgent::chat`] runs one bounded tool-calling turn and always returns
//! a reply string.

pub mod manager;

use chrono::{DateTime, Local};
use std::sync::Arc;

use crate::client::MemoryServiceClient;
use crate::config::AgentConfig;
use crate::error::TurnError;
use crate::extract::extract_user_key;
use crate::llm::openai::OpenAiProvider;
use crate::llm::{ChatMessage, ChatProvider, ToolSpec};
use crate::tools::{Tool, ToolContext, ToolRegistry};

pub use manager::AgentManager;

const EMPTY_REPLY: &str = "I apologize, but I could not process your request.";
const ROUND_LIMIT_REPLY: &str = "I'm sorry, I couldn't complete that request. \
     It needed more steps than I'm allowed to take in one turn. \
     Please try again with a simpler or more specific request.";
const TOOLS_RAN_PLACEHOLDER: &str = "I executed the requested operations.";

/// What the agent knows about who it is talking to. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    pub current_user: Option<String>,
    /// Raw user utterances, oldest first.
    pub history: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Completion calls allowed per user turn.
    pub max_rounds: usize,
    /// Append the detected user key to the message sent to the model.
    pub annotate_user_context: bool,
    /// Memory-service URL, shown in the system prompt.
    pub base_url: String,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            annotate_user_context: true,
            base_url: "http://localhost:5000".into(),
        }
    }
}

pub struct MemoryAgent {
    provider: Arc<dyn ChatProvider>,
    tools: ToolRegistry,
    options: AgentOptions,
    history: Vec<ChatMessage>,
    session: UserSession,
}

impl MemoryAgent {
    pub fn new(provider: Arc<dyn ChatProvider>, tools: ToolRegistry, options: AgentOptions) -> Self {
        let system = system_prompt(&options.base_url, Local::now());
        Self {
            provider,
            tools,
            options,
            history: vec![ChatMessage::system(system)],
            session: UserSession::default(),
        }
    }

    /// Validate `config`, then wire the memory client, built-in tools, and
    /// OpenAI-compatible provider together.
    pub fn from_config(config: &AgentConfig) -> anyhow::Result<Self> {
        config.validate_llm()?;

        let client = Arc::new(MemoryServiceClient::new(&config.service)?);
        let tools = ToolRegistry::with_memory_tools(client);
        let provider = OpenAiProvider::new(&config.llm)?;
        tracing::info!(model = provider.model(), tools = tools.len(), "agent ready");

        let options = AgentOptions {
            max_rounds: config.llm.max_rounds,
            base_url: config.service.base_url.clone(),
            ..AgentOptions::default()
        };
        Ok(Self::new(Arc::new(provider), tools, options))
    }

    /// Process one user utterance and return the reply.
    ///
    /// Never fails: provider errors and round-limit exhaustion are turned into
    /// the reply text.
    pub async fn chat(&mut self, input: &str) -> String {
        self.session.history.push(input.to_string());
        self.identify_user(input);

        let outgoing = match (&self.session.current_user, self.options.annotate_user_context) {
            (Some(user), true) => format!("{input}\n\n[Context: the current user key is \"{user}\"]"),
            _ => input.to_string(),
        };
        self.history.push(ChatMessage::user(outgoing));

        let ctx = ToolContext {
            current_user: self.session.current_user.clone(),
            utterance: input.to_string(),
        };

        match self.run_turn(&ctx).await {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                reply
            }
            Err(TurnError::RoundLimit { rounds }) => {
                tracing::warn!(rounds, "tool-calling round limit reached");
                self.history.push(ChatMessage::assistant(ROUND_LIMIT_REPLY));
                ROUND_LIMIT_REPLY.to_string()
            }
            Err(err @ TurnError::Provider(_)) => {
                tracing::warn!(error = %err, "completion provider failed");
                format!("Sorry, I encountered an error: {err}")
            }
        }
    }

    /// Reasoning and tool rounds for one turn. Intermediate tool traffic stays
    /// in a scratch copy; only the final reply reaches the persisted history.
    async fn run_turn(&self, ctx: &ToolContext) -> Result<String, TurnError> {
        let specs = self.tools.specs();
        let mut scratch = self.history.clone();

        let max_rounds = self.options.max_rounds;
        for round in 1..=max_rounds {
            // The last round must produce text, so it gets no tools.
            let last = round == max_rounds;
            let offered: &[ToolSpec] = if last && max_rounds > 1 { &[] } else { &specs };
            let completion = self.provider.complete(&scratch, offered).await?;
            if !completion.wants_tools() {
                let reply = completion
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY.to_string());
                return Ok(reply);
            }
            if last {
                tracing::warn!(
                    round,
                    calls = completion.tool_calls.len(),
                    "tool calls on the final round, not executing"
                );
                break;
            }

            tracing::debug!(round, calls = completion.tool_calls.len(), "executing tool calls");
            let results = self.tools.execute_all(&completion.tool_calls, ctx).await;
            let results = if results.is_empty() {
                "No tool produced a result.".to_string()
            } else {
                results.join("\n\n")
            };

            scratch.push(ChatMessage::assistant(
                completion
                    .content
                    .unwrap_or_else(|| TOOLS_RAN_PLACEHOLDER.to_string()),
            ));
            scratch.push(ChatMessage::user(format!(
                "Based on the tool results:\n\n{results}\n\nplease provide a natural language response to the user."
            )));
        }

        Err(TurnError::RoundLimit { rounds: max_rounds })
    }

    fn identify_user(&mut self, input: &str) {
        let Some(key) = extract_user_key(input, &self.session) else {
            return;
        };
        if self.session.current_user.as_deref() != Some(key.as_str()) {
            tracing::info!(user = %key, "identified user");
            self.session.current_user = Some(key);
        }
    }

    /// Drop everything but the system turn and forget the user.
    pub fn reset_session(&mut self) {
        self.history.truncate(1);
        self.session = UserSession::default();
        tracing::debug!("session reset");
    }

    pub fn reset_memory(&mut self) {
        self.reset_session();
    }

    /// Register another tool. Offered to the model from the next turn on.
    pub fn add_custom_tool(&mut self, tool: Arc<dyn Tool>) {
        self.tools.register(tool);
    }

    pub fn current_user(&self) -> Option<&str> {
        self.session.current_user.as_deref()
    }

    pub fn set_current_user(&mut self, user_key: impl Into<String>) {
        self.session.current_user = Some(user_key.into());
    }

    /// Raw user utterances this session.
    pub fn conversation_history(&self) -> &[String] {
        &self.session.history
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools.specs()
    }
}

fn system_prompt(base_url: &str, created_at: DateTime<Local>) -> String {
    format!(
        "You are a memory management assistant connected to the XDB memory service.

You can:
- List a user's memories, optionally filtered by tags or a search query. When the \
user asks about something specific, extract the key nouns or verbs as the query and \
run the search instead of suggesting one. Only omit the query when the user asks for \
all of their memories.
- Create memories and reminders with optional tags and session grouping. Record the \
content exactly as the user gave it; do not rewrite or improve it.

Every operation needs the user's key. Users identify themselves with phrases like \
\"my user key is X\", \"I am X\", or \"for user X\". If you don't know the user's key, \
ask for it.

Be conversational and brief. Explain what you did, summarize memories in natural \
language, and report errors plainly.

Session started: {}
Memory service: {base_url}",
        created_at.format("%Y-%m-%d %H:%M:%S %Z")
    )
}
