//! Error types for jarvis-tools

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a tool failure, reported back to the LLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Arguments did not match the declared schema
    InvalidArgs,
    /// The handler ran and failed
    ExecutionFailed,
    /// No tool registered under that name
    NotFound,
    /// The handler did not finish in time
    Timeout,
}

impl ToolErrorKind {
    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgs => "invalid_args",
            Self::ExecutionFailed => "execution_failed",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool error type
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Schema mismatch; the handler was not invoked
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Tool execution failed
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Tool not found
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

impl Error {
    /// The kind reported in the error payload
    #[must_use]
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            Self::InvalidArgs(_) => ToolErrorKind::InvalidArgs,
            Self::ExecutionFailed(_) => ToolErrorKind::ExecutionFailed,
            Self::NotFound(_) => ToolErrorKind::NotFound,
            Self::Timeout(_) => ToolErrorKind::Timeout,
        }
    }

    /// Structured payload fed back to the LLM as the tool message content:
    /// `{"error": {"kind": "...", "message": "..."}}`
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

impl From<jarvis_memory::Error> for Error {
    fn from(err: jarvis_memory::Error) -> Self {
        Self::ExecutionFailed(format!("storage error: {err}"))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = Error::InvalidArgs("$.city: missing required field".into()).to_payload();
        assert_eq!(payload["error"]["kind"], "invalid_args");
        assert!(payload["error"]["message"]
            .as_str()
            .unwrap()
            .contains("$.city"));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::Timeout(10).kind(), ToolErrorKind::Timeout);
        assert_eq!(Error::NotFound("x".into()).kind().as_str(), "not_found");
    }
}
