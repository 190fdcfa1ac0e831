//! Per-call context handed to every tool handler

use crate::error::Result;
use async_trait::async_trait;
use jarvis_memory::{MemoryStore, Order, OrderItem, OrderType, User};
use std::sync::Arc;
use uuid::Uuid;

/// A purchase the LLM asked for, before any approval decision.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// Household member the order is for
    pub target_user: Uuid,
    /// Order type
    pub order_type: OrderType,
    /// Requested items
    pub items: Vec<OrderItem>,
    /// Preferred platform
    pub platform: Option<String>,
}

/// Entry point into the order approval workflow.
///
/// Tools can only submit requests through this gate; approval decisions
/// stay with the implementation.
#[async_trait]
pub trait OrderGate: Send + Sync {
    /// Record a new order on behalf of `requester`. The returned order is
    /// pending, or approved if the requester's limits allow it.
    async fn submit(&self, requester: &User, request: OrderRequest) -> Result<Order>;
}

/// Everything a handler may touch during one call.
#[derive(Clone)]
pub struct ToolContext {
    /// The caller
    pub user: User,
    /// Conversation the call belongs to
    pub conversation_id: Option<Uuid>,
    /// Household memory
    pub store: Arc<dyn MemoryStore>,
    /// Order workflow
    pub orders: Arc<dyn OrderGate>,
}

impl ToolContext {
    /// Create a context for `user`
    pub fn new(user: User, store: Arc<dyn MemoryStore>, orders: Arc<dyn OrderGate>) -> Self {
        Self {
            user,
            conversation_id: None,
            store,
            orders,
        }
    }

    /// Attach the current conversation
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: Uuid) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("user", &self.user.identity)
            .field("conversation_id", &self.conversation_id)
            .finish_non_exhaustive()
    }
}
