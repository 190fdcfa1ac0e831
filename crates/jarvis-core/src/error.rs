//! Error types for jarvis-core
//!
//! The taxonomy mirrors how failures are handled during a turn: transport
//! problems are retried and then apologised for, tool errors go back to the
//! LLM, workflow errors are refused with no state change, and extraction
//! errors are only logged.

use jarvis_memory::OrderStatus;
use thiserror::Error;
use uuid::Uuid;

/// Spoken when the LLM cannot be reached.
pub const FALLBACK_APOLOGY: &str = "Sorry, I had trouble thinking about that. Could you try again?";

/// Spoken when the turn could not be written to memory.
pub const DEGRADED_REPLY: &str = "I heard you but couldn't save that.";

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// LLM or store unreachable after retrying
    #[error("transport error: {0}")]
    Transport(String),

    /// Tool dispatch failure
    #[error("tool error: {0}")]
    Tool(#[from] jarvis_tools::Error),

    /// Order transition outside the legal set
    #[error("order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Order that was addressed
        order_id: Uuid,
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// Request is missing required input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Caller lacks the permission for the action
    #[error("not authorized: {0}")]
    Authorization(String),

    /// Fact extraction failed
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Addressed entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Memory store failure
    #[error("store error: {0}")]
    Store(#[from] jarvis_memory::Error),

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] jarvis_llm::Error),

    /// Invalid settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error came from an unreachable collaborator
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Llm(e) => e.is_transport(),
            _ => false,
        }
    }

    /// Whether the request was refused by the order policy
    #[must_use]
    pub fn is_policy_denial(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. } | Self::Authorization(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Short sentences that can be spoken back to the user.
///
/// Messages are written for speech: no symbols, no markup, one or two
/// sentences at most.
pub trait UserFriendlyError {
    /// What went wrong, in plain words
    fn user_message(&self) -> String;

    /// What the user could do about it
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Transport(_) | Error::Llm(_) => FALLBACK_APOLOGY.to_string(),
            Error::Tool(e) => format!("That didn't work: {e}."),
            Error::InvalidTransition { from, to, .. } => {
                format!("That order is already {from}, so I can't mark it {to}.")
            }
            Error::InvalidRequest(_) => "I didn't quite get that.".to_string(),
            Error::Authorization(_) => "Sorry, you're not allowed to do that.".to_string(),
            Error::Extraction(_) => "I couldn't remember that part of our chat.".to_string(),
            Error::NotFound { entity, .. } => format!("I couldn't find that {entity}."),
            Error::Store(_) => DEGRADED_REPLY.to_string(),
            Error::Configuration(_) => "I'm not set up properly yet.".to_string(),
            Error::Internal(_) => "Something went wrong on my side.".to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Transport(_) | Error::Llm(_) | Error::Store(_) => {
                Some("Please try again in a moment.".to_string())
            }
            Error::Authorization(_) => {
                Some("Ask an adult in the house to approve it.".to_string())
            }
            Error::Configuration(_) => Some("Ask whoever set me up to check my settings.".to_string()),
            _ => None,
        }
    }
}

/// Format an error as a single spoken reply
pub fn format_error_for_voice(error: &Error) -> String {
    match error.suggestion() {
        Some(suggestion) => format!("{} {suggestion}", error.user_message()),
        None => error.user_message(),
    }
}

#[cfg(test)]
mod tests;
