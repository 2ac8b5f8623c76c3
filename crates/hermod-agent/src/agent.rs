//! Core Agent implementation.
//!
//! The [`Agent`] owns the turn loop: it loads a session's conversation,
//! alternates model calls with tool execution until the model answers in
//! plain text, and writes the conversation back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use hermod_llm::{
    CompletionRequest, CompletionResponse, Message, Role, SharedBackend, ToolCall,
    ToolCallDirective, ToolDefinition,
};
use hermod_mcp::McpOrchestrator;
use hermod_rag::Retriever;
use hermod_session::{ConversationCache, MemoryConversationStore, SharedConversationStore};
use parking_lot::Mutex;

use crate::error::{AgentError, Result};
use crate::tools::{execute_calls, format_tool_results, tool_definitions};
use crate::types::{AgentConfig, AgentResponse};

/// A session's turn lock. The guarded value is the session's cache handle,
/// so the cache is only reachable while the lock is held.
type SessionSlot = Arc<tokio::sync::Mutex<Arc<dyn ConversationCache>>>;

// ─────────────────────────────────────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────────────────────────────────────

/// The conversation agent.
///
/// Turns for the same session id run one at a time; turns for different
/// sessions run concurrently.
pub struct Agent {
    backend: SharedBackend,
    orchestrator: Option<Arc<McpOrchestrator>>,
    conversations: SharedConversationStore,
    retriever: Option<Arc<Retriever>>,
    config: AgentConfig,
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl Agent {
    /// Create an agent builder for fluent construction.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> Option<&Arc<McpOrchestrator>> {
        self.orchestrator.as_ref()
    }

    fn session_slot(&self, session_id: &str) -> SessionSlot {
        self.sessions
            .lock()
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(tokio::sync::Mutex::new(self.conversations.open(session_id)))
            })
            .clone()
    }

    /// Execute one turn of conversation.
    ///
    /// The conversation is persisted only when the turn completes, including
    /// when the iteration cap cuts it short. A model error abandons the turn
    /// and leaves the stored conversation untouched.
    pub async fn turn(&self, session_id: &str, user_text: &str) -> Result<AgentResponse> {
        let started = Instant::now();
        let slot = self.session_slot(session_id);
        let cache = slot.lock().await;

        let mut conversation = cache.messages().await;
        if conversation.is_empty() {
            conversation.push(Message::system(self.config.system_prompt.clone()));
        }

        tracing::info!(
            %session_id,
            history = conversation.len(),
            message_len = user_text.len(),
            "Turn started"
        );

        let context = self.retrieve_context(session_id, user_text).await;
        conversation.push(Message::user(user_text));

        let tools = match &self.orchestrator {
            Some(orchestrator) => tool_definitions(orchestrator).await,
            None => Vec::new(),
        };

        let max_iterations = self.config.max_iterations.max(1);
        let mut iterations = 0u32;
        let mut tool_calls = Vec::new();

        let (response, truncated) = loop {
            iterations += 1;

            let request = self.build_request(&conversation, context.as_deref(), &tools);
            tracing::debug!(
                %session_id,
                iteration = iterations,
                messages = request.messages.len(),
                tools = request.tools.len(),
                "Calling model"
            );

            let response = match self.backend.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(%session_id, iteration = iterations, error = %e, "Model call failed");
                    return Err(e.into());
                }
            };

            if response.has_text() {
                conversation.push(Message::assistant(response.text.clone()));
            }

            if !response.has_tool_calls() {
                break (response, false);
            }

            let calls: Vec<ToolCall> = response
                .tool_calls
                .iter()
                .cloned()
                .map(ToolCallDirective::normalize)
                .collect();
            tracing::info!(
                %session_id,
                iteration = iterations,
                tools = %calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", "),
                "Executing tools"
            );

            let records = execute_calls(self.orchestrator.as_deref(), calls).await;
            conversation.push(Message::user(format_tool_results(&records)));
            tool_calls.extend(records);

            if iterations >= max_iterations {
                tracing::warn!(%session_id, iterations, "Max iterations exceeded, returning last response");
                break (response, true);
            }
        };

        cache.save_messages(&conversation).await?;

        tracing::info!(
            %session_id,
            iterations,
            tool_calls = tool_calls.len(),
            total_tokens = response.usage.total_tokens,
            truncated,
            "Turn completed"
        );

        Ok(finish(response, started, iterations, tool_calls, truncated))
    }

    /// Forget a session's conversation.
    pub async fn reset(&self, session_id: &str) -> Result<()> {
        let slot = self.session_slot(session_id);
        let cache = slot.lock().await;
        cache.clear().await?;

        // Drop the slot so ids that are never used again do not accumulate.
        let mut sessions = self.sessions.lock();
        if sessions
            .get(session_id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            sessions.remove(session_id);
        }
        drop(sessions);

        tracing::info!(%session_id, "Conversation reset");
        Ok(())
    }

    /// The stored conversation for a session.
    pub async fn conversation(&self, session_id: &str) -> Vec<Message> {
        let existing = self.sessions.lock().get(session_id).cloned();
        match existing {
            Some(slot) => slot.lock().await.messages().await,
            None => self.conversations.open(session_id).messages().await,
        }
    }

    /// Retrieval failures are logged and the turn continues without context.
    async fn retrieve_context(&self, session_id: &str, query: &str) -> Option<String> {
        let retriever = self.retriever.as_ref()?;
        match retriever.retrieve(query).await {
            Ok(Some(context)) => {
                tracing::debug!(%session_id, context_len = context.len(), "Retrieved context");
                Some(context)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Retrieval failed, continuing without context");
                None
            }
        }
    }

    /// Retrieved context rides on the request's system message only.
    fn build_request(
        &self,
        conversation: &[Message],
        context: Option<&str>,
        tools: &[ToolDefinition],
    ) -> CompletionRequest {
        let mut messages = conversation.to_vec();
        if let Some(context) = context {
            match messages.first_mut() {
                Some(first) if first.role == Role::System => {
                    first.text = format!("{}\n\n{}", first.text, context);
                }
                _ => messages.insert(0, Message::system(context)),
            }
        }

        let mut request = CompletionRequest::new(messages).with_tools(tools.to_vec());
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

fn finish(
    response: CompletionResponse,
    started: Instant,
    iterations: u32,
    tool_calls: Vec<crate::types::ToolCallRecord>,
    truncated: bool,
) -> AgentResponse {
    AgentResponse {
        text: response.text,
        duration: started.elapsed(),
        usage: response.usage,
        iterations,
        tool_calls,
        truncated,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for constructing an [`Agent`].
#[derive(Default)]
pub struct AgentBuilder {
    backend: Option<SharedBackend>,
    orchestrator: Option<Arc<McpOrchestrator>>,
    conversations: Option<SharedConversationStore>,
    retriever: Option<Arc<Retriever>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model backend. Required.
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the tool orchestrator. Without one the model is offered no tools.
    pub fn with_orchestrator(mut self, orchestrator: Arc<McpOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Set where conversations live. Defaults to process memory.
    pub fn with_conversations(mut self, conversations: SharedConversationStore) -> Self {
        self.conversations = Some(conversations);
        self
    }

    /// Attach a retriever for knowledge-base context.
    pub fn with_retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let backend = self
            .backend
            .ok_or_else(|| AgentError::config("model backend is required"))?;

        Ok(Agent {
            backend,
            orchestrator: self.orchestrator,
            conversations: self
                .conversations
                .unwrap_or_else(|| Arc::new(MemoryConversationStore::new())),
            retriever: self.retriever,
            config: self.config,
            sessions: Mutex::new(HashMap::new()),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
