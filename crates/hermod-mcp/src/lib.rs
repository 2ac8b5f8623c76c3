//! MCP (Model Context Protocol) for Hermod, client and server side.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpOrchestrator                                            │
//! │  - Discovers tools from every provider                      │
//! │  - Routes tools/call to the owning provider                 │
//! └─────────────────────────────────────────────────────────────┘
//!                           │ ToolProvider
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//! ┌─────────────────────────┐ ┌─────────────────────────────────┐
//! │  McpClient              │ │  LocalProvider                  │
//! │  - JSON-RPC over HTTP   │ │  - In-process ToolService       │
//! │  - JSON or SSE replies  │ │                                 │
//! └─────────────────────────┘ └─────────────────────────────────┘
//!              │ HTTP POST                 │
//!              ▼                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  codec + server::dispatch                                   │
//! │  - decode_request / encode_response                         │
//! │  - initialize, tools/list, tools/call                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hermod_mcp::{McpClient, McpOrchestrator, McpServerConfig};
//!
//! let client = McpClient::connect(McpServerConfig::new("tools", "http://localhost:3000/mcp"))?;
//! let orchestrator = McpOrchestrator::new(vec![Arc::new(client)]);
//! orchestrator.discover_tools().await;
//!
//! let text = orchestrator.call_tool("get_time", serde_json::json!({})).await?;
//! ```
//!
//! # Protocol flow
//!
//! 1. Client sends `initialize`
//! 2. Server responds with its capabilities
//! 3. Client sends `notifications/initialized`
//! 4. Client calls `tools/list` and `tools/call`

pub mod client;
pub mod codec;
pub mod error;
pub mod orchestrator;
pub mod protocol;
pub mod provider;
pub mod server;
pub mod transport;

pub use client::{McpClient, McpServerConfig};
pub use codec::{
    EncodedResponse, decode_request, decode_response, encode_response, extract_json_payload,
    wants_event_stream,
};
pub use error::{McpError, Result};
pub use orchestrator::McpOrchestrator;
pub use protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, MCP_PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolContent, ToolInfo, ToolsCapability,
};
pub use provider::{LocalProvider, SharedProvider, ToolProvider};
pub use server::{ToolService, dispatch};
pub use transport::{HttpTransport, HttpTransportConfig};
