//! Application state shared across handlers.

use std::sync::Arc;

use hermod_mcp::ToolService;

#[derive(Clone)]
pub struct AppState {
    /// The tools served on `/mcp`.
    pub tools: Arc<dyn ToolService>,
}

impl AppState {
    pub fn new(tools: Arc<dyn ToolService>) -> Self {
        Self { tools }
    }
}
