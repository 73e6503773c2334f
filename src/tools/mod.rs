//! Tools the model may call.
//!
//! A [`Tool`] is a named, schema-described operation whose [`invoke`](Tool::invoke)
//! always yields text: failures are rendered as readable error strings for the
//! model rather than propagated. [`ToolRegistry`] keeps tools in registration
//! order and dispatches model tool calls to them.

pub mod create_memory;
pub mod list_memories;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::client::MemoryServiceClient;
use crate::error::ToolArgumentError;
use crate::llm::{ToolCallRequest, ToolSpec};

pub use create_memory::{CreateMemoryParams, CreateMemoryTool, SubmissionKind};
pub use list_memories::{ListMemoriesParams, ListMemoriesTool};

/// Per-turn context handed to tools so they can fill in what the model left out.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// The session's identified user, if any.
    pub current_user: Option<String>,
    /// The raw user utterance that started this turn.
    pub utterance: String,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters(&self) -> Value;

    /// Check `args` against [`parameters`](Self::parameters) before invoking.
    fn validate(&self, args: &Value) -> Result<(), String> {
        check_arguments(&self.parameters(), args)
    }

    /// Run the tool. Never fails: errors come back as text.
    async fn invoke(&self, ctx: &ToolContext, args: Value) -> String;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// A tool backed by a synchronous closure. Handy for small custom tools.
pub struct FnTool<F> {
    name: String,
    description: String,
    parameters: Value,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(&ToolContext, Value) -> String + Send + Sync,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        func: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            func,
        }
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&ToolContext, Value) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> String {
        (self.func)(ctx, args)
    }
}

/// Ordered collection of tools, looked up by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in memory tools, all sharing `client`.
    pub fn with_memory_tools(client: Arc<MemoryServiceClient>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ListMemoriesTool::new(Arc::clone(&client))));
        registry.register(Arc::new(CreateMemoryTool::new(
            Arc::clone(&client),
            SubmissionKind::Memory,
        )));
        registry.register(Arc::new(CreateMemoryTool::new(
            client,
            SubmissionKind::Reminder,
        )));
        registry
    }

    /// Append a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        tracing::debug!(name = tool.name(), "registering tool");
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => {
                tracing::warn!(name = tool.name(), "replacing tool with the same name");
                *existing = tool;
            }
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch one model tool call. `None` when no tool has that name.
    pub async fn invoke(&self, call: &ToolCallRequest, ctx: &ToolContext) -> Option<String> {
        let Some(tool) = self.get(&call.name) else {
            tracing::warn!(name = %call.name, "model requested unknown tool, skipping");
            return None;
        };

        let args = match parse_arguments(&call.arguments)
            .and_then(|args| tool.validate(&args).map(|()| args))
        {
            Ok(args) => args,
            Err(reason) => {
                let err = ToolArgumentError::Invalid {
                    tool: call.name.clone(),
                    reason,
                };
                tracing::info!(name = %call.name, %err, "rejecting tool call");
                return Some(format!("Error: {err}"));
            }
        };

        tracing::info!(name = %call.name, "invoking tool");
        Some(tool.invoke(ctx, args).await)
    }

    /// Run `calls` one after another, in the order requested, and collect the
    /// outputs of the ones that matched a tool.
    pub async fn execute_all(&self, calls: &[ToolCallRequest], ctx: &ToolContext) -> Vec<String> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            if let Some(output) = self.invoke(call, ctx).await {
                results.push(output);
            }
        }
        results
    }
}

/// Models sometimes send an empty string for "no arguments".
fn parse_arguments(raw: &str) -> Result<Value, String> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| format!("arguments are not valid JSON: {e}"))
}

/// Check that `args` is what `schema` describes: an object when the schema
/// says so, with every `required` key present and non-null, and top-level
/// properties of the declared JSON type.
pub fn check_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    check_types(schema, args)?;
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };
    for key in required.iter().filter_map(Value::as_str) {
        if args.get(key).map_or(true, Value::is_null) {
            return Err(format!("missing required argument `{key}`"));
        }
    }
    Ok(())
}

/// [`check_arguments`] without the `required` check.
pub fn check_types(schema: &Value, args: &Value) -> Result<(), String> {
    if let Some(expected) = schema.get("type") {
        if !type_matches(expected, args) {
            return Err(format!("expected {}, got {}", describe(expected), kind_of(args)));
        }
    }
    let (Some(properties), Some(object)) = (
        schema.get("properties").and_then(Value::as_object),
        args.as_object(),
    ) else {
        return Ok(());
    };
    for (key, value) in object {
        let Some(expected) = properties.get(key).and_then(|p| p.get("type")) else {
            continue;
        };
        if !type_matches(expected, value) {
            return Err(format!(
                "argument `{key}` should be {}, got {}",
                describe(expected),
                kind_of(value)
            ));
        }
    }
    Ok(())
}

/// `expected` is a JSON Schema `type`: a name or a list of names.
fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(name) => matches_type_name(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| matches_type_name(name, value)),
        _ => true,
    }
}

fn matches_type_name(name: &str, value: &Value) -> bool {
    match name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe(expected: &Value) -> String {
    match expected {
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.as_str().unwrap_or("any").to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode tool arguments into their typed parameter struct.
pub fn decode_params<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolArgumentError> {
    serde_json::from_value(args).map_err(|e| ToolArgumentError::Invalid {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// JSON Schema for `T` with `required` overridden. Parameter structs keep
/// fields optional so the tool can fall back to context, but the model should
/// still be told what it is expected to send.
pub fn params_schema<T: JsonSchema>(required: &[&str]) -> Value {
    let mut schema = Value::from(schemars::schema_for!(T));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.insert(
            "required".into(),
            Value::Array(required.iter().map(|r| Value::from(*r)).collect()),
        );
    }
    schema
}

/// Trimmed non-empty value, or `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
