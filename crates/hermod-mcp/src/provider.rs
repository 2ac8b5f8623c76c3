//! Tool providers: anything the orchestrator can list and call tools on.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::protocol::{CallToolResult, ToolInfo};
use crate::server::ToolService;

/// A source of tools, local or remote.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Stable identity used in logs and error messages.
    fn id(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult>;
}

/// Shared handle to a provider.
pub type SharedProvider = Arc<dyn ToolProvider>;

/// Exposes an in-process [`ToolService`] as a provider, skipping HTTP.
pub struct LocalProvider {
    id: String,
    service: Arc<dyn ToolService>,
}

impl LocalProvider {
    pub fn new(id: impl Into<String>, service: Arc<dyn ToolService>) -> Self {
        Self {
            id: id.into(),
            service,
        }
    }
}

#[async_trait]
impl ToolProvider for LocalProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        self.service.list_tools().await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.service.call_tool(name, arguments).await
    }
}
