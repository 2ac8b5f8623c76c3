//! MCP client for a single remote server.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    ListToolsResult, ServerInfo, ToolInfo, methods,
};
use crate::provider::ToolProvider;
use crate::transport::{HttpTransport, HttpTransportConfig};

/// Configuration for an MCP server connection.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Unique name for this server. Doubles as the provider id.
    pub name: String,
    /// Endpoint URL.
    pub url: String,
    /// HTTP headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Request timeout override.
    pub timeout: Option<Duration>,
    /// Retry count override.
    pub retries: Option<u32>,
}

impl McpServerConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
            retries: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    fn transport_config(&self) -> HttpTransportConfig {
        let mut config = HttpTransportConfig::new(&self.url);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(retries) = self.retries {
            config = config.with_retries(retries);
        }
        for (key, value) in &self.headers {
            config = config.with_header(key, value);
        }
        config
    }
}

/// An MCP client talking to one server over HTTP.
///
/// The handshake runs lazily on first use, or explicitly via
/// [`McpClient::initialize`].
pub struct McpClient {
    config: McpServerConfig,
    transport: HttpTransport,
    server_info: OnceCell<ServerInfo>,
    request_id: AtomicI64,
}

impl McpClient {
    /// Build a client. No network traffic happens until the first call.
    pub fn connect(config: McpServerConfig) -> Result<Self> {
        let transport = HttpTransport::connect(config.transport_config())?;
        tracing::info!(server = %config.name, url = %config.url, "configured MCP server");
        Ok(Self {
            config,
            transport,
            server_info: OnceCell::new(),
            request_id: AtomicI64::new(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Server info, once the handshake has completed.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.server_info.initialized()
    }

    fn next_request_id(&self) -> i64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);
        let response = self.transport.request(&request).await?;

        if response.id != request.id {
            tracing::debug!(
                server = %self.config.name,
                expected = ?request.id,
                got = ?response.id,
                "response id mismatch"
            );
        }

        response
            .into_result()
            .map_err(|e| McpError::server(e.code, e.message, e.data))
    }

    /// Perform the MCP handshake: `initialize`, then
    /// `notifications/initialized`. Repeated calls are no-ops.
    pub async fn initialize(&self) -> Result<&ServerInfo> {
        self.server_info
            .get_or_try_init(|| async {
                let params = serde_json::to_value(InitializeParams::default())?;
                let result = self.send_request(methods::INITIALIZE, Some(params)).await?;
                let init: InitializeResult = serde_json::from_value(result)?;

                tracing::info!(
                    server = %init.server_info.name,
                    version = %init.server_info.version,
                    protocol = %init.protocol_version,
                    "MCP server initialized"
                );

                self.transport
                    .notify(&JsonRpcRequest::notification(methods::INITIALIZED, None))
                    .await?;

                Ok::<_, McpError>(init.server_info)
            })
            .await
    }
}

#[async_trait]
impl ToolProvider for McpClient {
    fn id(&self) -> &str {
        &self.config.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        self.initialize().await?;
        let result = self.send_request(methods::TOOLS_LIST, None).await?;
        let list: ListToolsResult = serde_json::from_value(result)?;

        tracing::debug!(
            server = %self.config.name,
            tool_count = list.tools.len(),
            "listed MCP tools"
        );

        Ok(list.tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.initialize().await?;
        let params = CallToolParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        let result = self
            .send_request(methods::TOOLS_CALL, Some(serde_json::to_value(&params)?))
            .await?;

        tracing::debug!(server = %self.config.name, tool = %name, "called MCP tool");

        Ok(CallToolResult::from_value(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_builder() {
        let config = McpServerConfig::new("tools", "http://localhost:9000/mcp")
            .with_header("X-Api-Key", "secret")
            .with_timeout(Duration::from_secs(10))
            .with_retries(0);

        let transport = config.transport_config();
        assert_eq!(transport.url, "http://localhost:9000/mcp");
        assert_eq!(transport.timeout, Duration::from_secs(10));
        assert_eq!(transport.retries, 0);
        assert_eq!(transport.headers, vec![("X-Api-Key".to_string(), "secret".to_string())]);
    }

    #[test]
    fn test_transport_defaults_kept_without_overrides() {
        let transport = McpServerConfig::new("tools", "http://localhost/mcp").transport_config();
        assert_eq!(transport.timeout, Duration::from_secs(30));
        assert_eq!(transport.retries, 3);
    }

    #[test]
    fn test_request_ids_increase() {
        let client = McpClient::connect(McpServerConfig::new("t", "http://localhost/mcp")).unwrap();
        let a = client.next_request_id();
        let b = client.next_request_id();
        assert!(b > a);
        assert!(!client.is_initialized());
        assert_eq!(client.id(), "t");
    }
}
