//! Server module
//!
//! Configuration loading, dependency wiring and the HTTP run loop.
//!
//! # Module Structure
//!
//! - `config`: Configuration types (AppConfig and its sections)
//! - `loader`: Layered configuration loading
//! - `providers`: LLM provider resolution
//! - `init`: Store, tools and orchestrator wiring plus the serve loop

pub mod config;
mod init;
mod loader;
mod providers;

pub use init::{build_orchestrator, run};
pub use loader::load_config;
