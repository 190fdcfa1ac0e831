//! Scripted LLM provider for tests and offline runs
//!
//! Responses are served from a FIFO queue. When the queue is empty the
//! provider answers with its fallback response, which by default is a plain
//! "mock response" final answer. Every request is recorded so tests can
//! inspect the prompt that was actually sent.

use crate::completion::{
    CompletionRequest, CompletionResponse, ToolCompletionRequest, ToolCompletionResponse,
};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use crate::tools::ToolCall;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Scripted {
    Reply(ToolCompletionResponse),
    Fail(Error),
    Delayed(Duration, ToolCompletionResponse),
}

/// A mock LLM provider that returns queued responses.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    text_responses: Arc<Mutex<VecDeque<Result<String>>>>,
    fallback: ToolCompletionResponse,
    requests: Arc<Mutex<Vec<ToolCompletionRequest>>>,
    text_requests: Arc<Mutex<Vec<CompletionRequest>>>,
    stall_completions: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            text_responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: ToolCompletionResponse::text("mock response"),
            requests: Arc::new(Mutex::new(Vec::new())),
            text_requests: Arc::new(Mutex::new(Vec::new())),
            stall_completions: false,
        }
    }

    /// Answer with `response` whenever the queue is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, response: ToolCompletionResponse) -> Self {
        self.fallback = response;
        self
    }

    /// Make every text-only completion hang forever.
    ///
    /// Tool completions are unaffected. Requests are still recorded.
    #[must_use]
    pub fn with_stalled_completions(mut self) -> Self {
        self.stall_completions = true;
        self
    }

    /// Add a response to the queue.
    pub fn add_tool_response(&self, response: ToolCompletionResponse) {
        self.push(Scripted::Reply(response));
    }

    /// Queue a final answer.
    pub fn add_text_response(&self, content: impl Into<String>) {
        self.push(Scripted::Reply(ToolCompletionResponse::text(content)));
    }

    /// Queue a single tool call with JSON arguments.
    pub fn add_tool_call(&self, name: &str, arguments: serde_json::Value) {
        let id = format!("call_{}", self.pending() + self.request_count());
        self.push(Scripted::Reply(ToolCompletionResponse::calls(vec![
            ToolCall::new(id, name, arguments.to_string()),
        ])));
    }

    /// Queue a failure.
    pub fn add_error(&self, error: Error) {
        self.push(Scripted::Fail(error));
    }

    /// Queue a response that is only delivered after `delay`.
    pub fn add_delayed_response(&self, delay: Duration, response: ToolCompletionResponse) {
        self.push(Scripted::Delayed(delay, response));
    }

    /// Queue the result of the next text-only completion.
    pub fn add_completion(&self, result: Result<String>) {
        self.text_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    /// Requests received by `complete_with_tools`, oldest first.
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<ToolCompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Requests received by `complete`, oldest first.
    #[must_use]
    pub fn recorded_completions(&self) -> Vec<CompletionRequest> {
        self.text_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of tool-completion calls served so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn pending(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn push(&self, item: Scripted) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.text_requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        if self.stall_completions {
            std::future::pending::<()>().await;
        }

        let next = self
            .text_responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = match next {
            Some(result) => result?,
            None => "mock response".to_string(),
        };

        Ok(CompletionResponse {
            content,
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: "mock-model".to_string(),
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Scripted::Reply(resp)) => Ok(resp),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Delayed(delay, resp)) => {
                tokio::time::sleep(delay).await;
                Ok(resp)
            }
            None => Ok(self.fallback.clone()),
        }
    }
}
