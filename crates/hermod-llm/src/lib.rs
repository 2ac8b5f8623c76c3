//! Model backend abstraction for Hermod.
//!
//! The agent talks to a chat model through the [`LlmBackend`] trait and to an
//! embedding model through [`Embedder`]. Both are object-safe so concrete
//! providers can be swapped at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  LlmBackend trait                       │
//! │  - complete() -> CompletionResponse     │
//! └─────────────────────────────────────────┘
//!                    │
//!     ┌──────────────┼──────────────┐
//!     ▼              ▼              ▼
//! ┌────────┐   ┌──────────┐   ┌────────┐
//! │ OpenAI │   │  Ollama  │   │  Mock  │
//! └────────┘   └──────────┘   └────────┘
//! ```
//!
//! Tool calls come back as [`ToolCallDirective`]s in whichever shape the
//! provider used; [`ToolCallDirective::normalize`] turns them into a single
//! canonical [`ToolCall`].

pub mod backend;
pub mod embeddings;
pub mod error;
pub mod ollama;
pub mod openai;
pub mod types;

pub use backend::{LlmBackend, MockBackend, SharedBackend, with_retry};
pub use embeddings::{
    DEFAULT_EMBEDDING_MODEL, Embedder, EmbedderSpec, MockEmbedder, OllamaEmbedder,
    OllamaEmbedderConfig, SharedEmbedder, build_embedder,
};
pub use error::{LlmError, RateLimitInfo, Result};
pub use ollama::{OllamaBackend, OllamaConfig};
pub use openai::{OpenAiBackend, OpenAiConfig};
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, ToolCall, ToolCallDirective,
    ToolDefinition, Usage,
};
