//! Orchestrator core structure
//!
//! Contains the main `Orchestrator` struct and its builder methods.

use crate::extractor::{
    FactExtractor, FactMerger, LlmFactExtractor, MemoryExtractor, SessionSummarizer,
};
use crate::orders::{ApprovalNotifier, OrderWorkflow};
use crate::session_manager::{SessionConfig, SessionManager};
use jarvis_llm::LlmProvider;
use jarvis_memory::MemoryStore;
use jarvis_tools::{ToolRegistry, ToolRunner};
use std::sync::Arc;

use super::config::OrchestratorConfig;

/// Drives one voice turn from utterance to spoken reply
pub struct Orchestrator {
    pub(crate) llm: Arc<dyn LlmProvider>,
    pub(crate) runner: ToolRunner,
    pub(crate) sessions: SessionManager,
    pub(crate) store: Arc<dyn MemoryStore>,
    pub(crate) workflow: Arc<OrderWorkflow>,
    pub(crate) memory: MemoryExtractor,
    pub(crate) summarizer: SessionSummarizer,
    pub(crate) config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator.
    ///
    /// Extraction defaults to the LLM extractor on
    /// `config.extraction_model`; orders go through an [`OrderWorkflow`]
    /// with the default policy.
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tool_registry: Arc<ToolRegistry>,
        store: Arc<dyn MemoryStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let runner = ToolRunner::new(tool_registry, config.runner_config.clone());
        let sessions = SessionManager::new(
            Arc::clone(&store),
            SessionConfig::default()
                .with_history_window(config.history_window)
                .with_platform(&config.platform),
        );
        let extractor: Arc<dyn FactExtractor> = Arc::new(
            LlmFactExtractor::new(Arc::clone(&llm), &config.extraction_model)
                .with_timeout(config.llm_timeout),
        );
        let memory = Self::memory_pipeline(extractor, &store, &config);
        let summarizer = SessionSummarizer::new(Arc::clone(&llm), &config.extraction_model)
            .with_timeout(config.llm_timeout);

        Self {
            llm,
            runner,
            sessions,
            workflow: Arc::new(OrderWorkflow::new(Arc::clone(&store))),
            store,
            memory,
            summarizer,
            config,
        }
    }

    fn memory_pipeline(
        extractor: Arc<dyn FactExtractor>,
        store: &Arc<dyn MemoryStore>,
        config: &OrchestratorConfig,
    ) -> MemoryExtractor {
        MemoryExtractor::new(
            extractor,
            FactMerger::new(Arc::clone(store), config.similarity_threshold),
        )
        .with_min_transcript_chars(config.min_transcript_chars)
        .with_timeout(config.llm_timeout)
    }

    /// Replace the fact extractor
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn FactExtractor>) -> Self {
        self.memory = Self::memory_pipeline(extractor, &self.store, &self.config);
        self
    }

    /// Replace the order workflow
    #[must_use]
    pub fn with_workflow(mut self, workflow: Arc<OrderWorkflow>) -> Self {
        self.workflow = workflow;
        self
    }

    /// Use `notifier` for orders that need approval
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ApprovalNotifier>) -> Self {
        self.workflow = Arc::new(OrderWorkflow::new(Arc::clone(&self.store)).with_notifier(notifier));
        self
    }

    /// The order workflow
    #[must_use]
    pub fn workflow(&self) -> &Arc<OrderWorkflow> {
        &self.workflow
    }

    /// The session manager
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// The memory store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Get the LLM provider name
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    /// List all registered tool names
    #[must_use]
    pub fn list_tool_names(&self) -> Vec<String> {
        self.runner
            .registry()
            .names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}
