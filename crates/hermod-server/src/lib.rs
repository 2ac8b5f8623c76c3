//! MCP tool server for Hermod.
//!
//! Serves a fixed catalog of tools over MCP's JSON-RPC-over-HTTP transport.
//!
//! ```text
//! ┌──────────────┐  POST /mcp   ┌───────────────────────────────────────┐
//! │  MCP client  │─────────────▶│  routes::mcp                          │
//! └──────────────┘              │  decode → dispatch → encode (JSON/SSE)│
//!                               └───────────────────┬───────────────────┘
//!                                                   │ ToolService
//!                                                   ▼
//!                               ┌───────────────────────────────────────┐
//!                               │  ToolCatalog (ToolKind → handler)     │
//!                               └──┬─────────┬──────────┬─────────┬─────┘
//!                                  ▼         ▼          ▼         ▼
//!                              Weather   LocalGit  TicketStore TaskStore
//!                            (Open-Meteo) (git CLI)  (JSON file) (JSON file)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hermod_server::{Server, ToolCatalog};
//!
//! let catalog = ToolCatalog::from_config(&config.server(), &data_dir)?;
//! Server::new(Arc::new(catalog)).run("127.0.0.1:8080".parse()?).await?;
//! ```

pub mod calculator;
pub mod catalog;
pub mod error;
pub mod git;
pub mod json_file;
pub mod routes;
pub mod service;
pub mod state;
pub mod tasks;
pub mod tickets;
pub mod weather;

pub use catalog::{ToolDescriptor, ToolKind, tool_infos};
pub use error::{Result, ServerError, ToolError, ToolResult};
pub use git::{GitCli, LocalGit};
pub use service::{SERVER_NAME, ToolCatalog};
pub use state::AppState;
pub use tasks::{JsonTaskStore, Task, TaskPriority, TaskStatus, TaskStore};
pub use tickets::{JsonTicketStore, NewTicket, Ticket, TicketStore};
pub use weather::{OpenMeteoClient, WeatherService};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use hermod_mcp::ToolService;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// The MCP tool server.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(tools: Arc<dyn ToolService>) -> Self {
        Self {
            state: AppState::new(tools),
        }
    }

    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(routes::mcp_routes())
            .layer(cors_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve until the process stops.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "MCP server listening");
        }
        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Serve)
    }
}

/// Any origin and header; the usual methods.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

/// Parse `bind` and `port` into a socket address.
pub fn socket_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    format!("{}:{}", bind, port)
        .parse()
        .map_err(|_| ServerError::Address(format!("{}:{}", bind, port)))
}
