//! Registry - Tool registration and dispatch
//!
//! Tools are looked up by name and carry a typed [`ParamSchema`]. Dispatch
//! checks the caller's role, validates the arguments and only then runs the
//! handler.

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::schema::ParamSchema;
use futures::future::BoxFuture;
use jarvis_memory::Role;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Tool definition with metadata
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Tool name (unique identifier)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Argument schema
    pub parameters: ParamSchema,
    /// Roles that may not call this tool
    pub denied_roles: Vec<Role>,
}

impl ToolDefinition {
    /// Create a new tool definition with no arguments
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ParamSchema::object(),
            denied_roles: Vec::new(),
        }
    }

    /// Set the parameters schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParamSchema) -> Self {
        self.parameters = parameters;
        self
    }

    /// Forbid the tool for the given roles
    #[must_use]
    pub fn deny_roles(mut self, roles: &[Role]) -> Self {
        self.denied_roles.extend_from_slice(roles);
        self
    }

    /// Whether `role` may call this tool
    #[must_use]
    pub fn permits(&self, role: Role) -> bool {
        !self.denied_roles.contains(&role)
    }

    /// Convert to the LLM tool format
    #[must_use]
    pub fn to_llm(&self) -> jarvis_llm::ToolDefinition {
        jarvis_llm::ToolDefinition::new(
            &self.name,
            &self.description,
            self.parameters.to_json_schema(),
        )
    }
}

/// Successful tool result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    /// Structured data for the LLM
    pub data: Value,
    /// Short speakable summary
    pub message: String,
}

impl ToolOutput {
    /// Create an output
    #[must_use]
    pub fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }

    /// JSON text stored as the tool message content
    #[must_use]
    pub fn to_content(&self) -> String {
        serde_json::json!({ "message": self.message, "data": self.data }).to_string()
    }
}

/// Trait for implementing tools
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool. Arguments have already been validated.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput>;
}

/// Boxed async handler used by [`ToolRegistry::register_fn`]
pub type HandlerFn =
    Arc<dyn Fn(Value, ToolContext) -> BoxFuture<'static, Result<ToolOutput>> + Send + Sync>;

struct FnTool {
    definition: ToolDefinition,
    handler: HandlerFn,
}

#[async_trait::async_trait]
impl Tool for FnTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        (self.handler)(args, ctx.clone()).await
    }
}

/// Registry for managing tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name.clone();
        debug!(tool = %name, "Registering tool");
        self.tools.insert(name, tool);
    }

    /// Register a closure as a tool
    pub fn register_fn<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(Value, ToolContext) -> BoxFuture<'static, Result<ToolOutput>> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnTool {
            definition,
            handler: Arc::new(handler),
        }));
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Sorted tool names
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get tool count
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// LLM tool schemas visible to `role`, sorted by name
    #[must_use]
    pub fn definitions_for(&self, role: Role) -> Vec<jarvis_llm::ToolDefinition> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .filter(|def| def.permits(role))
            .map(ToolDefinition::to_llm)
            .collect()
    }

    /// Look up, authorize, validate and run a tool
    #[instrument(skip(self, args, ctx), fields(user = %ctx.user.identity))]
    pub async fn dispatch(&self, name: &str, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let definition = tool.definition();

        if !definition.permits(ctx.user.role) {
            warn!(tool = %name, role = %ctx.user.role, "Tool denied for role");
            return Err(Error::ExecutionFailed(format!(
                "'{name}' is not permitted for role {}",
                ctx.user.role
            )));
        }

        definition.parameters.validate(&args)?;
        tool.execute(args, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_context;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_definition() -> ToolDefinition {
        ToolDefinition::new("echo", "Repeat the text").with_parameters(
            ParamSchema::object().required_property("text", ParamSchema::string()),
        )
    }

    #[test]
    fn test_tool_definition_builder() {
        let def = echo_definition().deny_roles(&[Role::Child, Role::Guest]);
        assert!(def.permits(Role::Adult));
        assert!(!def.permits(Role::Child));
        let llm = def.to_llm();
        assert_eq!(llm.name, "echo");
        assert_eq!(llm.parameters["required"], json!(["text"]));
    }

    #[tokio::test]
    async fn test_dispatch_validates_before_invoking() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut registry = ToolRegistry::new();
        registry.register_fn(echo_definition(), move |args, _ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let text = args["text"].as_str().unwrap_or_default().to_string();
                Ok::<_, Error>(ToolOutput::new(text.clone(), json!({ "text": text })))
            }
            .boxed()
        });

        let ctx = test_context(Role::Adult).await;

        let err = registry
            .dispatch("echo", json!({"text": 5}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgs(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let out = registry
            .dispatch("echo", json!({"text": "hello"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.message, "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_and_denied() {
        let mut registry = ToolRegistry::new();
        registry.register_fn(
            echo_definition().deny_roles(&[Role::Guest]),
            |_args, _ctx| async { Ok::<_, Error>(ToolOutput::new("ok", json!({}))) }.boxed(),
        );

        let guest = test_context(Role::Guest).await;
        let err = registry
            .dispatch("echo", json!({"text": "hi"}), &guest)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not permitted"));

        let err = registry
            .dispatch("nope", json!({}), &guest)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        assert!(registry.definitions_for(Role::Guest).is_empty());
        assert_eq!(registry.definitions_for(Role::Adult).len(), 1);
    }
}
