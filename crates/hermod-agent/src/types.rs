//! Agent configuration and turn output.

use std::time::Duration;

use hermod_llm::Usage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools when they help \
     you answer, and answer directly when they do not.";

/// Iteration cap for interactive chat.
pub const INTERACTIVE_MAX_ITERATIONS: u32 = 5;

/// Iteration cap for unattended runs.
pub const BATCH_MAX_ITERATIONS: u32 = 20;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime configuration for an [`Agent`](crate::Agent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// First message of every new conversation.
    pub system_prompt: String,
    /// Model override; `None` uses the backend's default.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Model calls allowed per turn.
    pub max_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl AgentConfig {
    /// Config for interactive chat: at most 5 model calls per turn.
    pub fn interactive() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: None,
            temperature: None,
            max_tokens: None,
            max_iterations: INTERACTIVE_MAX_ITERATIONS,
        }
    }

    /// Config for one-shot runs that may chain many tools.
    pub fn batch() -> Self {
        Self {
            max_iterations: BATCH_MAX_ITERATIONS,
            ..Self::interactive()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
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

    /// Set max iterations. Zero is treated as one.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Turn output
// ─────────────────────────────────────────────────────────────────────────────

/// One tool invocation made during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    /// Normalized argument object that was sent.
    pub arguments: Value,
    /// Result text, or the error message when `success` is false.
    pub output: String,
    pub success: bool,
}

/// Output of [`Agent::turn`](crate::Agent::turn).
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// Text of the last model response.
    pub text: String,
    /// Wall-clock time for the whole turn.
    pub duration: Duration,
    /// Token usage reported by the last model call.
    pub usage: Usage,
    /// Number of model calls made.
    pub iterations: u32,
    pub tool_calls: Vec<ToolCallRecord>,
    /// The iteration cap ran out while the model was still calling tools.
    pub truncated: bool,
}

impl AgentResponse {
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}
