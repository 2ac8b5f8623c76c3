//! Server-side JSON-RPC dispatch.
//!
//! [`dispatch`] routes a decoded request to a [`ToolService`] and always
//! produces exactly one response for a request carrying an id. Notifications
//! produce none.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::protocol::{
    CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerInfo, ToolInfo, methods,
};

/// A set of tools that can be served over MCP.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// Identity reported in the `initialize` result.
    fn server_info(&self) -> ServerInfo;

    /// The tools this service exposes.
    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    /// Execute a tool.
    ///
    /// Unknown tools and tool-level failures should come back as an
    /// `isError` result; an `Err` here becomes a JSON-RPC internal error.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult>;
}

/// Route one request. Returns `None` for notifications.
pub async fn dispatch(service: &dyn ToolService, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.is_notification() {
        tracing::debug!(method = %request.method, "received notification");
        return None;
    }

    let id = request.id;
    let outcome = match request.method.as_str() {
        methods::INITIALIZE => initialize(service),
        methods::TOOLS_LIST => list_tools(service).await,
        methods::TOOLS_CALL => call_tool(service, request.params).await,
        other => Err(JsonRpcError::method_not_found(other)),
    };

    Some(match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => {
            tracing::debug!(method = %request.method, code = error.code, "request failed");
            JsonRpcResponse::failure(id, error)
        }
    })
}

type Outcome = std::result::Result<Value, JsonRpcError>;

fn initialize(service: &dyn ToolService) -> Outcome {
    let result = InitializeResult::for_server(service.server_info());
    serde_json::to_value(result).map_err(JsonRpcError::internal)
}

async fn list_tools(service: &dyn ToolService) -> Outcome {
    let tools = service.list_tools().await.map_err(JsonRpcError::internal)?;
    serde_json::to_value(ListToolsResult { tools }).map_err(JsonRpcError::internal)
}

async fn call_tool(service: &dyn ToolService, params: Option<Value>) -> Outcome {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("params is required"))?;
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcError::invalid_params("'name' is required"))?;

    let arguments = match params.get("arguments") {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => Value::Object(Map::new()),
    };

    tracing::debug!(tool = %name, "dispatching tool call");
    let result = service
        .call_tool(name, arguments)
        .await
        .map_err(JsonRpcError::internal)?;
    serde_json::to_value(result).map_err(JsonRpcError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpError;
    use serde_json::json;

    struct EchoService;

    #[async_trait]
    impl ToolService for EchoService {
        fn server_info(&self) -> ServerInfo {
            ServerInfo::new("echo", "0.1.0")
        }

        async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
            Ok(vec![ToolInfo::new(
                "echo",
                "Echo the arguments",
                json!({"type": "object", "properties": {}, "required": []}),
            )])
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
            match name {
                "echo" => Ok(CallToolResult::text(arguments.to_string())),
                "explode" => Err(McpError::handler("kaboom")),
                other => Ok(CallToolResult::error(format!("Tool '{}' not found", other))),
            }
        }
    }

    fn call(params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(5, methods::TOOLS_CALL, params)
    }

    #[tokio::test]
    async fn test_initialize() {
        let resp = dispatch(&EchoService, JsonRpcRequest::new(1, "initialize", None))
            .await
            .unwrap();
        let result = resp.into_result().unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["serverInfo"]["name"], "echo");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = dispatch(&EchoService, JsonRpcRequest::new(2, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(resp.id, Some(2));
        let err = resp.error.unwrap();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);
        assert_eq!(err.message, "Method not found: resources/list");
    }

    #[tokio::test]
    async fn test_call_requires_name() {
        let resp = dispatch(&EchoService, call(None)).await.unwrap();
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);

        let resp = dispatch(&EchoService, call(Some(json!({"arguments": {}}))))
            .await
            .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
        assert!(err.message.contains("'name'"));
    }

    #[tokio::test]
    async fn test_call_defaults_arguments() {
        let resp = dispatch(&EchoService, call(Some(json!({"name": "echo"}))))
            .await
            .unwrap();
        let result = CallToolResult::from_value(resp.into_result().unwrap());
        assert_eq!(result.text_content(), "{}");
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result_not_protocol_error() {
        let resp = dispatch(&EchoService, call(Some(json!({"name": "nope"}))))
            .await
            .unwrap();
        assert!(!resp.is_error());
        let result = CallToolResult::from_value(resp.into_result().unwrap());
        assert!(result.is_error());
        assert_eq!(result.text_content(), "Tool 'nope' not found");
    }

    #[tokio::test]
    async fn test_handler_failure_is_internal_error() {
        let resp = dispatch(&EchoService, call(Some(json!({"name": "explode"}))))
            .await
            .unwrap();
        assert_eq!(resp.id, Some(5));
        let err = resp.error.unwrap();
        assert_eq!(err.code, JsonRpcError::INTERNAL_ERROR);
        assert!(err.message.starts_with("Internal error: "));
        assert!(err.message.contains("kaboom"));
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let note = JsonRpcRequest::notification(methods::INITIALIZED, None);
        assert!(dispatch(&EchoService, note).await.is_none());
    }
}
