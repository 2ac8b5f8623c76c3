//! Model backend trait, shared retry logic and a scripted mock.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{LlmError, Result};
use crate::types::{CompletionRequest, CompletionResponse};

// ─────────────────────────────────────────────────────────────────────────────
// Shared Retry Logic
// ─────────────────────────────────────────────────────────────────────────────

/// Execute an async operation with exponential backoff retry.
///
/// Retries only on transient errors. Non-retryable errors are returned
/// immediately.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    backend_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() || attempt >= max_retries => return Err(e),
            Err(e) => {
                attempt += 1;
                let wait = e.retry_after().unwrap_or(backoff);
                tracing::warn!(
                    backend = backend_name,
                    attempt,
                    max_retries,
                    backoff_ms = wait.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(wait).await;
                backoff *= 2;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A chat model that can answer a conversation, optionally with tool calls.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Execute a completion request and return the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the name of this backend.
    fn name(&self) -> &str;
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A scripted backend for tests.
///
/// Replies are returned in order. Once the script runs out every call fails
/// with a backend error.
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    responses: Mutex<VecDeque<Result<CompletionResponse>>>,
    request_log: Mutex<Vec<CompletionRequest>>,
    repeat_last: Option<CompletionResponse>,
}

impl MockBackend {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            name: "mock".to_string(),
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            request_log: Mutex::new(Vec::new()),
            repeat_last: None,
        }
    }

    /// A mock that answers once with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![CompletionResponse::text(text)])
    }

    /// A mock that returns `response` for every call.
    pub fn repeating(response: CompletionResponse) -> Self {
        Self {
            repeat_last: Some(response),
            ..Self::new(Vec::new())
        }
    }

    /// Queue an error as the next reply.
    pub fn then_error(self, error: LlmError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Queue a reply.
    pub fn then(self, response: CompletionResponse) -> Self {
        self.responses.lock().push_back(Ok(response));
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.request_log.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.request_log.lock().push(request);

        if let Some(next) = self.responses.lock().pop_front() {
            return next;
        }
        match &self.repeat_last {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
