//! HTTP transport for MCP.
//!
//! Every request is a single POST carrying one JSON-RPC message. Servers may
//! answer with plain JSON or an SSE frame; [`crate::codec`] handles both.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::codec::{ACCEPT_BOTH, CONTENT_TYPE_JSON, decode_response};
use crate::error::{McpError, Result};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Configuration for HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Endpoint URL of the MCP server.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Number of retries for requests that never reached the server.
    pub retries: u32,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(30),
            retries: 3,
            headers: Vec::new(),
        }
    }
}

impl HttpTransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Async HTTP transport with a pooled client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Validate the URL and build the underlying client.
    pub fn connect(config: HttpTransportConfig) -> Result<Self> {
        url::Url::parse(&config.url)
            .map_err(|e| McpError::transport(format!("invalid URL '{}': {}", config.url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| McpError::transport(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            url = %config.url,
            timeout_secs = config.timeout.as_secs(),
            retries = config.retries,
            "created HTTP transport"
        );

        Ok(Self { client, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn post(&self, body: String) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(ACCEPT, ACCEPT_BOTH)
            .body(body);
        for (key, value) in &self.config.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        req
    }

    /// Send a request and wait for its response.
    ///
    /// Failures to reach the server are retried; HTTP error statuses and
    /// undecodable bodies are not.
    pub async fn request(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let json = serde_json::to_string(request)?;
        tracing::trace!(url = %self.config.url, json = %json, "sending MCP HTTP request");

        let mut retries = self.config.retries;
        let resp = loop {
            match self.post(json.clone()).send().await {
                Ok(resp) => break resp,
                Err(e) => {
                    if retries == 0 {
                        return Err(McpError::transport(format!("HTTP request failed: {}", e)));
                    }
                    retries -= 1;
                    tracing::warn!(
                        url = %self.config.url,
                        error = %e,
                        retries_remaining = retries,
                        "HTTP request failed, retrying"
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        };

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| McpError::transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(McpError::transport(format!("HTTP error {}: {}", status, text)));
        }

        tracing::trace!(json = %text, "received MCP HTTP response");
        decode_response(&text)
    }

    /// Fire a notification. The server's reply, if any, is ignored.
    pub async fn notify(&self, notification: &JsonRpcRequest) -> Result<()> {
        let json = serde_json::to_string(notification)?;
        if let Err(e) = self.post(json).send().await {
            tracing::debug!(url = %self.config.url, error = %e, "notification not delivered");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = HttpTransportConfig::new("http://localhost:8080/mcp")
            .with_timeout(Duration::from_secs(5))
            .with_retries(1)
            .with_header("Authorization", "Bearer token");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retries, 1);
        assert_eq!(config.headers.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retries, 3);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = HttpTransport::connect(HttpTransportConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));
        assert!(err.to_string().contains("invalid URL"));
    }

    #[tokio::test]
    async fn test_unreachable_server_exhausts_retries() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::connect(
            HttpTransportConfig::new(format!("http://127.0.0.1:{}/mcp", port))
                .with_timeout(Duration::from_secs(2))
                .with_retries(1),
        )
        .unwrap();

        let err = transport
            .request(&JsonRpcRequest::new(1, "tools/list", None))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));
    }
}
