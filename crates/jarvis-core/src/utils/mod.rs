//! Utility modules for jarvis-core
//!
//! - retry: Retry logic with exponential backoff
//! - voice: Shaping replies for speech

mod retry;
mod voice;

pub use retry::{retry_with_backoff, RetryConfig, RetryError};
pub use voice::{is_farewell, truncate_for_voice};
