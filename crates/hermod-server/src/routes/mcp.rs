//! The MCP JSON-RPC endpoint.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::post,
};
use hermod_mcp::{JsonRpcResponse, decode_request, dispatch, encode_response, wants_event_stream};

use crate::error::Result;
use crate::state::AppState;

pub const MCP_PATH: &str = "/mcp";

/// Decode, dispatch and encode one JSON-RPC message.
///
/// Protocol errors are JSON-RPC error responses with status 200.
/// Notifications get an empty 202.
pub async fn mcp_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let wants_sse = wants_event_stream(headers.get(ACCEPT).and_then(|v| v.to_str().ok()));

    let response = match decode_request(&body) {
        Ok(request) => match dispatch(state.tools.as_ref(), request).await {
            Some(response) => response,
            None => return Ok(StatusCode::ACCEPTED.into_response()),
        },
        Err(error) => {
            tracing::debug!(code = error.code, message = %error.message, "rejected request body");
            JsonRpcResponse::failure(None, error)
        }
    };

    let encoded = encode_response(&response, wants_sse)?;
    Ok(([(CONTENT_TYPE, encoded.content_type)], encoded.body).into_response())
}

pub fn mcp_routes() -> Router<AppState> {
    Router::new().route(MCP_PATH, post(mcp_handler))
}
