//! End-to-end: a real HTTP server driven by the MCP client and orchestrator.

mod common;

use std::sync::Arc;

use anyhow::Result;
use common::TestServer;
use hermod_mcp::{
    McpClient, McpError, McpOrchestrator, McpServerConfig, SharedProvider, ToolProvider,
};
use serde_json::json;

fn client(server: &TestServer) -> Result<McpClient> {
    Ok(McpClient::connect(McpServerConfig::new("hermod", server.mcp_url()))?)
}

#[tokio::test]
async fn test_handshake_and_listing() -> Result<()> {
    let server = TestServer::start().await?;
    let client = client(&server)?;

    let info = client.initialize().await?;
    assert_eq!(info.name, "hermod-server");

    let first = client.list_tools().await?;
    let second = client.list_tools().await?;
    assert_eq!(first, second);
    assert_eq!(first.len(), hermod_server::ToolKind::ALL.len());
    Ok(())
}

#[tokio::test]
async fn test_orchestrated_calls() -> Result<()> {
    let server = TestServer::start().await?;
    let provider: SharedProvider = Arc::new(client(&server)?);
    let orchestrator = McpOrchestrator::new(vec![provider]);
    assert_eq!(orchestrator.discover_tools().await, hermod_server::ToolKind::ALL.len());
    assert_eq!(orchestrator.provider_for("calculate").as_deref(), Some("hermod"));

    let sum = orchestrator
        .call_tool("calculate", json!({"expression": "2 + 2"}))
        .await?;
    assert_eq!(sum, "Result: 4");

    let weather = orchestrator
        .call_tool("get_current_weather", json!({"city": "Tromso"}))
        .await?;
    assert!(weather.contains("Slight snowfall"));

    let hourly = orchestrator
        .call_tool("get_hourly_forecast", json!({"city": "Tromso", "hours": 500}))
        .await?;
    assert!(hourly.starts_with("Hourly forecast for Tromso (168 hours):"));

    let err = orchestrator
        .call_tool("git_status_local", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::ToolFailed { .. }));
    assert!(err.to_string().contains("GIT_REPO_PATH"));

    let missing = orchestrator.call_tool("nope", json!({})).await.unwrap_err();
    assert!(matches!(missing, McpError::ToolNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_stores_persist_to_disk() -> Result<()> {
    let server = TestServer::start().await?;
    let client = client(&server)?;

    let created = client
        .call_tool(
            "create_task",
            json!({"name": "ship", "description": "release 1.0", "priority": "high"}),
        )
        .await?;
    assert!(!created.is_error());

    let listed = client
        .call_tool("list_tasks", json!({"priority": "HIGH", "status": "NEW"}))
        .await?;
    assert!(listed.text_content().contains("ship"));

    let raw = std::fs::read_to_string(server.temp_dir.path().join("tasks.json"))?;
    let tasks: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(tasks[0]["priority"], "HIGH");
    assert_eq!(tasks[0]["status"], "NEW");
    Ok(())
}
