//! Jarvis Core - Agent orchestration engine
//!
//! This crate provides the core of the Jarvis household voice assistant:
//! - Orchestrator: bounded LLM and tool-call loop for one voice turn
//! - Session Manager: voice session to conversation mapping
//! - Extractor: facts and preferences learned from conversations
//! - Orders: role-gated approval workflow for purchases
//! - Utils: retry with backoff and reply shaping for speech

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod orders;
pub mod session_manager;
pub mod utils;

pub use error::{
    format_error_for_voice, Error, Result, UserFriendlyError, DEGRADED_REPLY, FALLBACK_APOLOGY,
};
pub use extractor::{
    Candidate, ContradictionPolicy, FactDecision, FactExtractor, FactMerger, LlmFactExtractor,
    MemoryExtractor, MergeReport, RuleBasedExtractor, SessionSummarizer, Transcript,
};
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, ToolCallRecord, TurnInput, TurnOutcome, TurnStatus,
};
pub use orders::{ApprovalNotifier, ApprovalPolicy, LogNotifier, OrderWorkflow};
pub use session_manager::{Session, SessionConfig, SessionManager};
pub use utils::{retry_with_backoff, RetryConfig};
