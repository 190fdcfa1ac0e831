//! Jarvis LLM - provider abstraction
//!
//! This crate defines the contract between the assistant core and the
//! language model:
//! - Messages, tool schemas and tool calls
//! - Completion requests and the two response shapes (final text or tool calls)
//! - The `LlmProvider` trait
//! - An OpenAI implementation and a scripted mock

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod tools;
pub mod util;

pub use completion::{
    CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::LlmProvider;
pub use tools::{ToolCall, ToolChoice, ToolDefinition};
