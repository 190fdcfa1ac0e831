//! Orchestrator tool execution
//!
//! Tool calls run one at a time in the order the LLM listed them. Each call
//! produces exactly one tool message, successful or not; failures are
//! reported as an error payload for the LLM to react to.

use jarvis_llm::{Message, ToolCall};
use jarvis_memory::NewMessage;
use jarvis_tools::ToolContext;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::core::Orchestrator;
use super::types::ToolCallRecord;

impl Orchestrator {
    /// Execute a list of tool calls sequentially, appending one tool
    /// message per call to both the durable log and `messages`.
    ///
    /// Returns `false` if any tool message could not be persisted.
    pub(crate) async fn execute_tool_calls(
        &self,
        conversation_id: Uuid,
        tool_calls: &[ToolCall],
        ctx: &ToolContext,
        messages: &mut Vec<Message>,
        records: &mut Vec<ToolCallRecord>,
    ) -> bool {
        let mut persisted = true;
        for call in tool_calls {
            info!(
                conversation_id = %conversation_id,
                tool = %call.name,
                args = %call.arguments,
                "Executing tool"
            );

            let start = Instant::now();
            let (input, result) = match parse_arguments(&call.arguments) {
                Ok(input) => {
                    let result = self.runner.run(&call.name, input.clone(), ctx).await;
                    (input, result)
                }
                Err(e) => (Value::Null, Err(e)),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let (content, output, success) = match result {
                Ok(output) => (output.to_content(), output.data.clone(), true),
                Err(e) => {
                    warn!(tool = %call.name, kind = %e.kind(), error = %e, "Tool call failed");
                    let payload = e.to_payload();
                    (payload.to_string(), payload, false)
                }
            };

            if let Err(e) = self
                .sessions
                .append_message(conversation_id, NewMessage::tool(&call.name, &call.id, &content))
                .await
            {
                warn!(tool = %call.name, error = %e, "Failed to persist tool message");
                persisted = false;
            }
            messages.push(Message::tool_response(&call.id, &call.name, content));

            records.push(ToolCallRecord {
                tool_name: call.name.clone(),
                call_id: call.id.clone(),
                input,
                output,
                success,
                duration_ms,
            });
        }
        persisted
    }
}

/// Arguments arrive as a JSON string; blank means no arguments.
fn parse_arguments(raw: &str) -> jarvis_tools::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw)
        .map_err(|e| jarvis_tools::Error::InvalidArgs(format!("arguments are not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments("").unwrap(), serde_json::json!({}));
        assert_eq!(parse_arguments(r#"{"city":"Pune"}"#).unwrap()["city"], "Pune");
        let err = parse_arguments("{city: Pune").unwrap_err();
        assert_eq!(err.kind(), jarvis_tools::ToolErrorKind::InvalidArgs);
    }
}
