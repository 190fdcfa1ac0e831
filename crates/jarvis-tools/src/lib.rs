//! Jarvis Tools - Tool Registry and household tools
//!
//! This crate provides the tool system for Jarvis:
//! - Schema: typed parameter declarations, validated before dispatch
//! - Registry: name-keyed dispatch with role gating
//! - Runner: timeout-guarded execution
//! - Builtins: time, calculator, weather, reminders, grocery list, orders

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod context;
pub mod error;
pub mod registry;
pub mod runner;
pub mod schema;

#[cfg(test)]
mod testing;

pub use builtins::{register_builtins, register_builtins_with_config, BuiltinsConfig};
pub use context::{OrderGate, OrderRequest, ToolContext};
pub use error::{Error, Result, ToolErrorKind};
pub use registry::{HandlerFn, Tool, ToolDefinition, ToolOutput, ToolRegistry};
pub use runner::{RunnerConfig, ToolRunner};
pub use schema::ParamSchema;
