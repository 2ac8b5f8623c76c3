//! Core types for model requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// Plain text content.
    pub text: String,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────────────────────────────────────

/// A tool the model may call, described as a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call as emitted by a model, in one of two wire shapes.
///
/// Backends produce this; callers turn it into a [`ToolCall`] with
/// [`ToolCallDirective::normalize`] before doing anything else with it.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallDirective {
    /// Arguments arrived as a JSON value.
    Structured { name: String, arguments: Value },
    /// Arguments arrived as a string that should contain JSON.
    Legacy { name: String, arguments: String },
}

impl ToolCallDirective {
    pub fn structured(name: impl Into<String>, arguments: Value) -> Self {
        Self::Structured {
            name: name.into(),
            arguments,
        }
    }

    pub fn legacy(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self::Legacy {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Structured { name, .. } | Self::Legacy { name, .. } => name,
        }
    }

    /// Collapse into the canonical `(name, argument map)` form.
    ///
    /// Legacy strings that do not parse to a JSON object are kept verbatim
    /// under an `input` key.
    pub fn normalize(self) -> ToolCall {
        match self {
            Self::Structured { name, arguments } => {
                let arguments = match arguments {
                    Value::Object(map) => map,
                    Value::Null => Map::new(),
                    other => wrap_input(other),
                };
                ToolCall { name, arguments }
            }
            Self::Legacy { name, arguments } => {
                let arguments = if arguments.trim().is_empty() {
                    Map::new()
                } else {
                    match serde_json::from_str::<Value>(&arguments) {
                        Ok(Value::Object(map)) => map,
                        _ => wrap_input(Value::String(arguments)),
                    }
                };
                ToolCall { name, arguments }
            }
        }
    }
}

fn wrap_input(value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("input".to_string(), value);
    map
}

/// A tool call in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// A completion request to a model backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Model override; backends fall back to their configured model.
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage for a single model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A model response: visible text plus any tool-call directives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCallDirective>,
    pub usage: Usage,
    pub model: String,
}

impl CompletionResponse {
    /// A plain text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A response that only requests tool calls.
    pub fn tool_calls(calls: Vec<ToolCallDirective>) -> Self {
        Self {
            tool_calls: calls,
            ..Default::default()
        }
    }

    pub fn with_tool_call(mut self, call: ToolCallDirective) -> Self {
        self.tool_calls.push(call);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// True when the response carries non-blank text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
