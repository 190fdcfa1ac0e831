//! OpenAI - async-openai provider

use crate::completion::{
    CompletionRequest, CompletionResponse, TokenUsage, ToolCompletionRequest,
    ToolCompletionResponse,
};
use crate::error::{Error, Result};
use crate::message::{Message, MessageRole};
use crate::provider::LlmProvider;
use crate::tools::{ToolCall, ToolChoice, ToolDefinition};
use crate::util::{mask_api_key, sanitize_api_error};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequest,
        CreateChatCompletionResponse, FunctionCall, FunctionObject, ToolChoiceOptions,
    },
    Client,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default conversational model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for the OpenAI provider
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key for authentication
    pub api_key: String,
    /// Optional custom base URL (for Azure OpenAI or proxies)
    pub base_url: Option<String>,
    /// Default model to use for completions
    pub default_model: String,
    /// Request timeout duration
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            default_model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`
    ///
    /// # Errors
    /// Returns error if `OPENAI_API_KEY` is not set
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::NotConfigured("OPENAI_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);
        config.base_url = std::env::var("OPENAI_BASE_URL").ok();
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.default_model = model;
        }
        Ok(config)
    }

    /// Sets a custom base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Sets the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI API provider for chat completions
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    default_model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Creates a new provider with the given configuration
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config),
            default_model: config.default_model,
            timeout: config.timeout,
        }
    }

    /// Creates a provider from environment variables
    ///
    /// # Errors
    /// Returns error if `OPENAI_API_KEY` is not set
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(OpenAiConfig::from_env()?))
    }

    fn convert_message(msg: &Message) -> Result<ChatCompletionRequestMessage> {
        let message = match msg.role {
            MessageRole::System => ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                name: None,
            }
            .into(),
            MessageRole::User => ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }
            .into(),
            MessageRole::Assistant => {
                let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
                    msg.tool_calls
                        .iter()
                        .map(|call| {
                            ChatCompletionMessageToolCalls::Function(
                                ChatCompletionMessageToolCall {
                                    id: call.id.clone(),
                                    function: FunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.clone(),
                                    },
                                },
                            )
                        })
                        .collect()
                });
                let content = (!msg.content.is_empty()).then(|| {
                    ChatCompletionRequestAssistantMessageContent::Text(msg.content.clone())
                });

                #[allow(deprecated)]
                ChatCompletionRequestAssistantMessage {
                    content,
                    name: None,
                    tool_calls,
                    function_call: None,
                    refusal: None,
                    audio: None,
                }
                .into()
            }
            MessageRole::Tool => {
                let tool_call_id = msg.tool_call_id.as_ref().ok_or_else(|| {
                    Error::InvalidResponse("Tool message missing tool_call_id".to_string())
                })?;
                ChatCompletionRequestToolMessage {
                    content: ChatCompletionRequestToolMessageContent::Text(msg.content.clone()),
                    tool_call_id: tool_call_id.clone(),
                }
                .into()
            }
        };
        Ok(message)
    }

    fn convert_tool(tool: &ToolDefinition) -> ChatCompletionTools {
        ChatCompletionTools::Function(ChatCompletionTool {
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
                strict: None,
            },
        })
    }

    fn convert_tool_choice(choice: &ToolChoice) -> ChatCompletionToolChoiceOption {
        let mode = match choice {
            ToolChoice::Auto => ToolChoiceOptions::Auto,
            ToolChoice::None => ToolChoiceOptions::None,
            ToolChoice::Required => ToolChoiceOptions::Required,
        };
        ChatCompletionToolChoiceOption::Mode(mode)
    }

    fn map_error(err: OpenAIError) -> Error {
        match err {
            OpenAIError::Reqwest(e) => Error::Network(sanitize_api_error(&e.to_string())),
            other => {
                let text = other.to_string();
                if text.to_lowercase().contains("rate limit") {
                    Error::RateLimit
                } else {
                    Error::Api(sanitize_api_error(&text))
                }
            }
        }
    }

    async fn send(&self, request: CreateChatCompletionRequest) -> Result<CreateChatCompletionResponse> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| Error::Timeout(timeout_ms))?
            .map_err(Self::map_error)
    }

    fn resolve_model<'a>(&'a self, requested: &'a str) -> &'a str {
        if requested.is_empty() {
            &self.default_model
        } else {
            requested
        }
    }

    fn usage(response: &CreateChatCompletionResponse) -> Option<TokenUsage> {
        response.usage.as_ref().map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let messages: Vec<ChatCompletionRequestMessage> = request
            .messages
            .iter()
            .map(Self::convert_message)
            .collect::<Result<_>>()?;

        let openai_request = CreateChatCompletionRequest {
            model: self.resolve_model(&request.model).to_string(),
            messages,
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
            ..Default::default()
        };

        debug!("Sending request to OpenAI");
        let response = self.send(openai_request).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.clone().unwrap_or_default(),
            usage: Self::usage(&response),
            finish_reason: choice.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            model: response.model.clone(),
        })
    }

    #[instrument(skip(self, request), fields(model = %request.request.model, tools = request.tools.len()))]
    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse> {
        let messages: Vec<ChatCompletionRequestMessage> = request
            .request
            .messages
            .iter()
            .map(Self::convert_message)
            .collect::<Result<_>>()?;

        let tools = (!request.tools.is_empty())
            .then(|| request.tools.iter().map(Self::convert_tool).collect());

        let openai_request = CreateChatCompletionRequest {
            model: self.resolve_model(&request.request.model).to_string(),
            messages,
            tool_choice: tools
                .as_ref()
                .map(|_| Self::convert_tool_choice(&request.tool_choice)),
            tools,
            max_completion_tokens: request.request.max_tokens,
            temperature: request.request.temperature,
            ..Default::default()
        };

        debug!("Sending tool request to OpenAI");
        let response = self.send(openai_request).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .as_ref()
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|tc| match tc {
                        ChatCompletionMessageToolCalls::Function(func_call) => Some(ToolCall {
                            id: func_call.id.clone(),
                            name: func_call.function.name.clone(),
                            arguments: func_call.function.arguments.clone(),
                        }),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ToolCompletionResponse {
            content: choice.message.content.clone(),
            tool_calls,
            usage: Self::usage(&response),
            finish_reason: choice.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            model: response.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OpenAiConfig::new("test-key")
            .with_model("gpt-4o-mini")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = OpenAiConfig::new("sk-1234567890abcdefghijklmnop");
        let debug_str = format!("{:?}", config);

        assert!(!debug_str.contains("1234567890abcdefghijkl"));
        assert!(debug_str.contains("sk-1...mnop"));
    }

    #[test]
    fn test_tool_message_requires_call_id() {
        let mut msg = Message::tool_response("call_1", "calculator", "{}");
        assert!(OpenAiProvider::convert_message(&msg).is_ok());

        msg.tool_call_id = None;
        assert!(matches!(
            OpenAiProvider::convert_message(&msg),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_resolve_model_falls_back_to_default() {
        let provider = OpenAiProvider::new(OpenAiConfig::new("sk-test-key-000000"));
        assert_eq!(provider.resolve_model(""), DEFAULT_MODEL);
        assert_eq!(provider.resolve_model("gpt-4o-mini"), "gpt-4o-mini");
    }
}
