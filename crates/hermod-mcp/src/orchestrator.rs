//! Aggregates tools from many providers behind one catalog.
//!
//! Discovery builds a fresh name→provider map and swaps it in whole, so
//! concurrent callers always see either the old catalog or the new one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{McpError, Result};
use crate::protocol::ToolInfo;
use crate::provider::SharedProvider;

#[derive(Clone)]
struct Route {
    provider: SharedProvider,
    info: ToolInfo,
}

#[derive(Default)]
struct ToolRoutes {
    by_name: HashMap<String, Route>,
    /// Tool names in discovery order.
    order: Vec<String>,
}

/// Routes tool calls to whichever provider owns the tool.
pub struct McpOrchestrator {
    providers: Vec<SharedProvider>,
    routes: RwLock<Arc<ToolRoutes>>,
    discovered: AtomicBool,
}

impl Default for McpOrchestrator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl McpOrchestrator {
    pub fn new(providers: Vec<SharedProvider>) -> Self {
        Self {
            providers,
            routes: RwLock::new(Arc::new(ToolRoutes::default())),
            discovered: AtomicBool::new(false),
        }
    }

    /// Add a provider. Takes effect on the next discovery.
    pub fn with_provider(mut self, provider: SharedProvider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Query every provider and rebuild the catalog.
    ///
    /// Providers that fail are logged and skipped. When two providers expose
    /// the same tool name, the later one wins. Returns the number of tools.
    pub async fn discover_tools(&self) -> usize {
        let mut routes = ToolRoutes::default();

        for provider in &self.providers {
            let tools = match provider.list_tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    tracing::warn!(
                        provider = %provider.id(),
                        error = %e,
                        "tool provider unavailable, skipping"
                    );
                    continue;
                }
            };

            tracing::debug!(provider = %provider.id(), tool_count = tools.len(), "discovered tools");

            for info in tools {
                let name = info.name.clone();
                let route = Route {
                    provider: provider.clone(),
                    info,
                };
                match routes.by_name.insert(name.clone(), route) {
                    Some(previous) => tracing::warn!(
                        tool = %name,
                        previous = %previous.provider.id(),
                        replacement = %provider.id(),
                        "tool name collision, later provider wins"
                    ),
                    None => routes.order.push(name),
                }
            }
        }

        let count = routes.order.len();
        *self.routes.write() = Arc::new(routes);
        self.discovered.store(true, Ordering::SeqCst);

        tracing::info!(
            providers = self.providers.len(),
            tools = count,
            "tool discovery complete"
        );
        count
    }

    /// Run discovery once if it has not happened yet.
    pub async fn ensure_discovered(&self) {
        if !self.discovered.load(Ordering::SeqCst) {
            self.discover_tools().await;
        }
    }

    fn snapshot(&self) -> Arc<ToolRoutes> {
        self.routes.read().clone()
    }

    /// The current catalog, in discovery order.
    pub fn tools(&self) -> Vec<ToolInfo> {
        let routes = self.snapshot();
        routes
            .order
            .iter()
            .filter_map(|name| routes.by_name.get(name))
            .map(|route| route.info.clone())
            .collect()
    }

    /// Id of the provider that owns `name`.
    pub fn provider_for(&self, name: &str) -> Option<String> {
        self.snapshot()
            .by_name
            .get(name)
            .map(|route| route.provider.id().to_string())
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.snapshot().by_name.contains_key(name)
    }

    /// Call a tool and flatten its result to text.
    ///
    /// An `isError` result comes back as [`McpError::ToolFailed`] carrying
    /// the tool's own prose.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        self.ensure_discovered().await;

        let route = self
            .snapshot()
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;

        tracing::debug!(tool = %name, provider = %route.provider.id(), "calling tool");

        let result = route
            .provider
            .call_tool(name, arguments)
            .await
            .map_err(|e| McpError::ToolExecution {
                provider: route.provider.id().to_string(),
                tool: name.to_string(),
                message: e.to_string(),
            })?;

        let text = result.text_content();
        if result.is_error() {
            return Err(McpError::ToolFailed {
                tool: name.to_string(),
                message: text,
            });
        }
        Ok(text)
    }
}

impl std::fmt::Debug for McpOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpOrchestrator")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .field("tools", &self.snapshot().order)
            .finish()
    }
}
