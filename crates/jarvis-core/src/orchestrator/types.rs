//! Orchestrator types
//!
//! - `TurnStatus` and `TurnOutcome` for the result of one turn
//! - `ToolCallRecord` for tool call tracking

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The LLM produced a final answer
    Completed,
    /// The tool-call round bound was hit
    RoundLimit,
    /// The LLM could not be reached
    LlmUnavailable,
    /// The turn could not be written to the store
    Degraded,
    /// The user said goodbye
    Farewell,
}

/// Result of one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// What to say back
    pub spoken_text: String,
    /// Whether the voice session should close
    pub should_end_session: bool,
    /// Conversation the turn belongs to
    pub conversation_id: Option<Uuid>,
    /// LLM calls made
    pub rounds: usize,
    /// Tool calls made, in order
    pub tool_calls: Vec<ToolCallRecord>,
    /// How the turn ended
    pub status: TurnStatus,
}

impl TurnOutcome {
    pub(crate) fn degraded(spoken_text: impl Into<String>) -> Self {
        Self {
            spoken_text: spoken_text.into(),
            should_end_session: false,
            conversation_id: None,
            rounds: 0,
            tool_calls: Vec::new(),
            status: TurnStatus::Degraded,
        }
    }
}

/// Record of a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool name
    pub tool_name: String,
    /// Call id assigned by the LLM
    pub call_id: String,
    /// Input arguments
    pub input: serde_json::Value,
    /// Output or error payload
    pub output: serde_json::Value,
    /// Whether it succeeded
    pub success: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
