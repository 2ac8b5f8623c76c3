//! Wire framing for MCP over HTTP.
//!
//! A response body is either plain JSON or a single Server-Sent Events frame,
//! depending on what the caller's `Accept` header asks for. Both directions go
//! through this module so framing decisions live in one place.

use serde_json::Value;

use crate::error::{McpError, Result};
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_SSE: &str = "text/event-stream";

/// Accept header sent by clients that can handle either framing.
pub const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// An encoded response body plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResponse {
    pub content_type: &'static str,
    pub body: String,
}

/// Decode a raw request body.
///
/// Anything that is not a JSON object shaped like a request is a parse
/// error; the returned error carries the parser detail in its message.
pub fn decode_request(raw: &[u8]) -> std::result::Result<JsonRpcRequest, JsonRpcError> {
    let value: Value = serde_json::from_slice(raw).map_err(JsonRpcError::parse_error)?;
    if !value.is_object() {
        return Err(JsonRpcError::parse_error("request must be a JSON object"));
    }
    serde_json::from_value(value).map_err(JsonRpcError::parse_error)
}

/// True when the `Accept` header asks for an event stream.
pub fn wants_event_stream(accept: Option<&str>) -> bool {
    accept.is_some_and(|value| value.contains(CONTENT_TYPE_SSE))
}

/// Serialize a response once and frame it.
pub fn encode_response(response: &JsonRpcResponse, wants_sse: bool) -> Result<EncodedResponse> {
    let json = serde_json::to_string(response)?;
    if wants_sse {
        Ok(EncodedResponse {
            content_type: CONTENT_TYPE_SSE,
            body: format!("data: {}\n\n", json),
        })
    } else {
        Ok(EncodedResponse {
            content_type: CONTENT_TYPE_JSON,
            body: json,
        })
    }
}

/// Pull the JSON payload out of a response body.
///
/// Plain JSON bodies pass through. SSE bodies have every `data: ` line
/// collected and concatenated in order.
pub fn extract_json_payload(body: &str) -> Result<String> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    let payload: String = body
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|data| !data.is_empty())
        .collect();

    if payload.is_empty() {
        return Err(McpError::protocol("response body has no JSON payload"));
    }
    Ok(payload)
}

/// Decode a response body in either framing.
pub fn decode_response(body: &str) -> Result<JsonRpcResponse> {
    let payload = extract_json_payload(body)?;
    Ok(serde_json::from_str(&payload)?)
}
