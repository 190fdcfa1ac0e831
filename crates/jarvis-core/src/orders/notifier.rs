use crate::error::Result;
use async_trait::async_trait;
use jarvis_memory::{Order, User};
use tracing::info;

/// Notification collaborator told about orders that need a decision.
///
/// Delivery (push, SMS, a chat message to a parent) lives outside the core.
/// Failures are logged by the workflow and never undo the transition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    /// An order is waiting for one of `approvers`
    async fn order_pending(&self, order: &Order, approvers: &[User]) -> Result<()>;

    /// An order was approved or rejected
    async fn order_resolved(&self, order: &Order) -> Result<()>;
}

/// Notifier that only writes log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl ApprovalNotifier for LogNotifier {
    async fn order_pending(&self, order: &Order, approvers: &[User]) -> Result<()> {
        info!(
            order_id = %order.id,
            total = order.total_amount,
            approvers = approvers.len(),
            "Order awaiting approval"
        );
        Ok(())
    }

    async fn order_resolved(&self, order: &Order) -> Result<()> {
        info!(order_id = %order.id, status = %order.status, "Order decided");
        Ok(())
    }
}
