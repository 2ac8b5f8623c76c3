//! OpenAI-compatible chat completions backend.
//!
//! Works against OpenAI itself and any service exposing the same
//! `/chat/completions` surface (Groq, Ollama's `/v1`, local gateways).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{LlmBackend, with_retry};
use crate::error::{LlmError, RateLimitInfo, Result};
use crate::types::{CompletionRequest, CompletionResponse, ToolCallDirective, Usage};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Default model when neither config nor request names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (optional for local services).
    pub api_key: Option<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Model used when the request does not override it.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries for transient errors.
    pub max_retries: u32,
    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,
    /// Name for this backend instance.
    pub name: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            name: "openai".to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Read the key from `OPENAI_API_KEY`.
    pub fn openai_from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LlmError::missing_setting("llm.api_key (or OPENAI_API_KEY)"))?;
        Ok(Self::openai(api_key))
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI Backend
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI-compatible API backend.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(header::CONTENT_TYPE, "application/json");
        match self.config.api_key {
            Some(ref api_key) => builder.header(header::AUTHORIZATION, format!("Bearer {}", api_key)),
            None => builder,
        }
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAiChatRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.text.clone(),
            })
            .collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| OpenAiTool {
                        tool_type: "function".to_string(),
                        function: OpenAiFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect(),
            )
        };

        OpenAiChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages,
            tools,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    async fn handle_response(response: Response) -> Result<CompletionResponse> {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_from_status(status.as_u16(), &body, retry_after.as_deref()));
        }

        parse_chat_response(&body)
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let openai_request = self.to_openai_request(&request);

        tracing::debug!(
            backend = %self.config.name,
            model = %openai_request.model,
            messages = openai_request.messages.len(),
            tools = openai_request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "Sending OpenAI-compatible request"
        );

        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .add_headers(self.client.post(self.completions_url()))
                    .json(&openai_request)
                    .send()
                    .await?;

                Self::handle_response(response).await
            },
        )
        .await
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

/// Map a non-success HTTP status to an error.
fn error_from_status(status: u16, body: &str, retry_after: Option<&str>) -> LlmError {
    let message = serde_json::from_str::<OpenAiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    match status {
        401 | 403 => LlmError::Auth(message),
        429 => LlmError::RateLimit(RateLimitInfo::from_header(message, retry_after)),
        500..=599 => LlmError::Backend(format!("Server error: {}", message)),
        _ => LlmError::Backend(message),
    }
}

/// Decode a chat completions body into a response.
///
/// `function.arguments` is a JSON string per the API, but some servers send
/// an object; both are kept as directives and normalized by the caller.
fn parse_chat_response(body: &str) -> Result<CompletionResponse> {
    let parsed: OpenAiChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Serialization(e.to_string()))?;

    let usage = parsed
        .usage
        .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    let Some(choice) = parsed.choices.into_iter().next() else {
        return Ok(CompletionResponse::default()
            .with_usage(usage)
            .with_model(parsed.model));
    };

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| match tc.function.arguments {
            Value::String(raw) => ToolCallDirective::legacy(tc.function.name, raw),
            other => ToolCallDirective::structured(tc.function.name, other),
        })
        .collect();

    Ok(CompletionResponse {
        text: choice.message.content.unwrap_or_default(),
        tool_calls,
        usage,
        model: parsed.model,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    function: OpenAiFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, ToolDefinition};
    use serde_json::json;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(OpenAiConfig::openai("sk-test").with_model("test-model")).unwrap()
    }

    #[test]
    fn test_request_conversion() {
        let request = CompletionRequest::new(vec![
            Message::system("You are helpful."),
            Message::user("Weather in Oslo?"),
        ])
        .with_tools(vec![ToolDefinition::new(
            "get_current_weather",
            "Current weather",
            json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        )])
        .with_temperature(0.2);

        let wire = serde_json::to_value(backend().to_openai_request(&request)).unwrap();
        assert_eq!(wire["model"], "test-model");
        assert_eq!(wire["messages"][0]["role"], "system");
        assert_eq!(wire["messages"][1]["content"], "Weather in Oslo?");
        assert_eq!(wire["tools"][0]["type"], "function");
        assert_eq!(wire["tools"][0]["function"]["name"], "get_current_weather");
        assert!(wire.get("max_tokens").is_none());
    }

    #[test]
    fn test_request_model_override() {
        let request = CompletionRequest::new(vec![Message::user("hi")]).with_model("other");
        assert_eq!(backend().to_openai_request(&request).model, "other");
    }

    #[test]
    fn test_parse_string_arguments_as_legacy() {
        let body = json!({
            "model": "m",
            "choices": [{"message": {"content": null, "tool_calls": [
                {"id": "c1", "type": "function", "function": {"name": "calculate", "arguments": "{\"expression\":\"1+1\"}"}}
            ]}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        });
        let resp = parse_chat_response(&body.to_string()).unwrap();
        assert!(!resp.has_text());
        assert_eq!(
            resp.tool_calls,
            vec![ToolCallDirective::legacy("calculate", "{\"expression\":\"1+1\"}")]
        );
        assert_eq!(resp.usage.total_tokens, 7);
    }

    #[test]
    fn test_parse_object_arguments_as_structured() {
        let body = json!({
            "choices": [{"message": {"content": "checking", "tool_calls": [
                {"function": {"name": "get_time", "arguments": {"tz": "UTC"}}}
            ]}}]
        });
        let resp = parse_chat_response(&body.to_string()).unwrap();
        assert_eq!(resp.text, "checking");
        assert_eq!(
            resp.tool_calls,
            vec![ToolCallDirective::structured("get_time", json!({"tz": "UTC"}))]
        );
        assert_eq!(resp.usage, Usage::default());
    }

    #[test]
    fn test_error_mapping() {
        let body = r#"{"error": {"message": "bad key"}}"#;
        assert!(matches!(error_from_status(401, body, None), LlmError::Auth(ref m) if m == "bad key"));

        let err = error_from_status(429, body, Some("3"));
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));

        let err = error_from_status(502, "upstream down", None);
        assert!(matches!(err, LlmError::Backend(ref m) if m.contains("upstream down")));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = OpenAiConfig::default().with_base_url("http://localhost:11434/v1/");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
    }
}
