//! Bridging the MCP tool catalog and the model's tool-calling interface.

use hermod_llm::{ToolCall, ToolDefinition};
use hermod_mcp::{McpError, McpOrchestrator, ToolInfo};

use crate::types::ToolCallRecord;

/// Closing line of every tool-results message.
pub const TOOL_RESULTS_INSTRUCTION: &str =
    "Use these results to form your answer to the user.";

/// The orchestrator's catalog as function descriptors for the model.
pub async fn tool_definitions(orchestrator: &McpOrchestrator) -> Vec<ToolDefinition> {
    orchestrator.ensure_discovered().await;
    orchestrator.tools().iter().map(to_definition).collect()
}

fn to_definition(info: &ToolInfo) -> ToolDefinition {
    ToolDefinition::new(
        info.name.clone(),
        info.description.clone().unwrap_or_default(),
        info.schema_or_empty(),
    )
}

/// Run `calls` one after another, in order. Failures are captured, not raised.
pub async fn execute_calls(
    orchestrator: Option<&McpOrchestrator>,
    calls: Vec<ToolCall>,
) -> Vec<ToolCallRecord> {
    let mut records = Vec::with_capacity(calls.len());
    for call in calls {
        let arguments = call.arguments_value();
        let outcome = match orchestrator {
            Some(orchestrator) => orchestrator.call_tool(&call.name, arguments.clone()).await,
            None => Err(McpError::ToolNotFound(call.name.clone())),
        };

        let record = match outcome {
            Ok(output) => ToolCallRecord {
                name: call.name,
                arguments,
                output,
                success: true,
            },
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                ToolCallRecord {
                    name: call.name,
                    arguments,
                    output: e.to_string(),
                    success: false,
                }
            }
        };
        records.push(record);
    }
    records
}

/// The user message that feeds tool output back to the model.
pub fn format_tool_results(records: &[ToolCallRecord]) -> String {
    let entries: Vec<String> = records
        .iter()
        .map(|r| {
            if r.success {
                format!("Tool: {}\nResult: {}", r.name, r.output)
            } else {
                format!("Tool: {}\nError: {}", r.name, r.output)
            }
        })
        .collect();
    format!(
        "Tool results:\n{}\n\n{}",
        entries.join("\n\n"),
        TOOL_RESULTS_INSTRUCTION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, output: &str, success: bool) -> ToolCallRecord {
        ToolCallRecord {
            name: name.to_string(),
            arguments: json!({}),
            output: output.to_string(),
            success,
        }
    }

    #[test]
    fn test_format_tool_results() {
        let text = format_tool_results(&[
            record("calculate", "4", true),
            record("weather", "city not found", false),
        ]);
        assert_eq!(
            text,
            "Tool results:\nTool: calculate\nResult: 4\n\nTool: weather\nError: city not found\n\n\
             Use these results to form your answer to the user."
        );
    }

    #[test]
    fn test_to_definition_defaults() {
        let info = ToolInfo {
            name: "bare".to_string(),
            description: None,
            input_schema: None,
        };
        let def = to_definition(&info);
        assert_eq!(def.name, "bare");
        assert_eq!(def.description, "");
        assert_eq!(def.parameters, json!({"type": "object", "properties": {}}));
    }

    #[tokio::test]
    async fn test_execute_without_orchestrator() {
        let call = hermod_llm::ToolCallDirective::structured("ghost", json!({"a": 1})).normalize();
        let records = execute_calls(None, vec![call]).await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].output, "tool 'ghost' not found in any MCP provider");
        assert_eq!(records[0].arguments, json!({"a": 1}));
    }
}
