//! Agent core for Hermod.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Agent                                                      │
//! │  - per-session turn lock                                    │
//! │  - model call ⇄ tool execution loop, capped per turn        │
//! │  - retrieved context on the system message, never stored    │
//! └─────────────────────────────────────────────────────────────┘
//!          │                │                 │              │
//!          ▼                ▼                 ▼              ▼
//!    ┌──────────┐   ┌───────────────┐   ┌───────────┐   ┌─────────┐
//!    │LlmBackend│   │McpOrchestrator│   │Conversation│   │Retriever│
//!    │(hermod-  │   │ (hermod-mcp)  │   │   Store    │   │(hermod- │
//!    │   llm)   │   │               │   │ (session)  │   │  rag)   │
//!    └──────────┘   └───────────────┘   └───────────┘   └─────────┘
//! ```

pub mod agent;
pub mod error;
pub mod tools;
pub mod types;

pub use agent::{Agent, AgentBuilder};
pub use error::{AgentError, Result};
pub use tools::{TOOL_RESULTS_INSTRUCTION, format_tool_results, tool_definitions};
pub use types::{
    AgentConfig, AgentResponse, BATCH_MAX_ITERATIONS, DEFAULT_SYSTEM_PROMPT,
    INTERACTIVE_MAX_ITERATIONS, ToolCallRecord,
};
