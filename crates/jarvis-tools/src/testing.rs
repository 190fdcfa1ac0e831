//! Shared fixtures for unit tests

use crate::context::{OrderGate, OrderRequest, ToolContext};
use crate::error::Result;
use async_trait::async_trait;
use jarvis_memory::{MemoryStore, Order, Role, SqliteStore, User};
use std::sync::Arc;

/// Stores every request as a pending order.
pub(crate) struct StoreGate {
    pub store: Arc<dyn MemoryStore>,
}

#[async_trait]
impl OrderGate for StoreGate {
    async fn submit(&self, requester: &User, request: OrderRequest) -> Result<Order> {
        let order = Order::new(
            request.target_user,
            requester.id,
            request.order_type,
            request.items,
        )
        .with_platform(request.platform);
        self.store.insert_order(&order).await?;
        Ok(order)
    }
}

pub(crate) async fn test_context(role: Role) -> ToolContext {
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    let user = User::new(format!("{role}-device"), "Asha", role);
    store.create_user(&user).await.unwrap();
    let orders = Arc::new(StoreGate {
        store: Arc::clone(&store),
    });
    ToolContext::new(user, store, orders)
}
