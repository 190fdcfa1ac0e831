//! Orchestrator - Main execution loop
//!
//! Turns one voice utterance into a spoken reply: a bounded loop of LLM
//! calls and tool invocations, followed by fact extraction.
//!
//! # Module Structure
//!
//! - `types`: Outcome types (TurnOutcome, TurnStatus, ToolCallRecord)
//! - `config`: Configuration types (OrchestratorConfig, TurnInput)
//! - `core`: Orchestrator struct and builder methods
//! - `prompt`: System prompt assembly
//! - `process`: Main execution loop
//! - `tool_execution`: Tool execution logic
//! - `lifecycle`: Greeting and session end

mod config;
mod core;
mod lifecycle;
mod process;
mod prompt;
mod tool_execution;
mod types;

#[cfg(test)]
mod tests;

// Re-export public types
pub use config::{OrchestratorConfig, TurnInput};
pub use core::Orchestrator;
pub use lifecycle::WELCOME_GREETING;
pub use process::{EMPTY_REPLY, FAREWELL_REPLY};
pub use types::{ToolCallRecord, TurnOutcome, TurnStatus};
