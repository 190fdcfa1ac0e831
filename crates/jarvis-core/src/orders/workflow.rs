use super::notifier::{ApprovalNotifier, LogNotifier};
use super::policy::{check_transition, ApprovalPolicy};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use jarvis_memory::{
    MemoryStore, Order, OrderFilter, OrderItem, OrderStatus, OrderType, User,
};
use jarvis_tools::{OrderGate, OrderRequest};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Drives orders through their lifecycle
pub struct OrderWorkflow {
    store: Arc<dyn MemoryStore>,
    policy: ApprovalPolicy,
    notifier: Arc<dyn ApprovalNotifier>,
}

impl OrderWorkflow {
    /// Create a workflow with the default policy and a logging notifier
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            policy: ApprovalPolicy::default(),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Set the approval policy
    #[must_use]
    pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ApprovalNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Record a new order.
    ///
    /// The order starts pending. It is approved on the spot when the
    /// requester does not need approval and today's approved spend plus
    /// this order stays within their daily limit; otherwise approvers are
    /// notified.
    #[instrument(skip(self, requester, items), fields(requester = %requester.id))]
    pub async fn create(
        &self,
        requester: &User,
        target_user: Uuid,
        order_type: OrderType,
        items: Vec<OrderItem>,
        platform: Option<String>,
    ) -> Result<Order> {
        if items.is_empty() {
            return Err(Error::InvalidRequest("an order needs at least one item".into()));
        }
        if target_user != requester.id && self.store.get_user(target_user).await?.is_none() {
            return Err(Error::NotFound {
                entity: "user",
                id: target_user.to_string(),
            });
        }

        let mut order = Order::new(target_user, requester.id, order_type, items).with_platform(platform);
        self.store.insert_order(&order).await?;
        info!(order_id = %order.id, total = order.total_amount, "Order created");

        if self.within_own_limit(requester, order.total_amount).await? {
            order.status = OrderStatus::Approved;
            order.approved_at = Some(Utc::now());
            if self.store.update_order_if_status(&order, OrderStatus::Pending).await? {
                info!(order_id = %order.id, "Order approved automatically");
                return Ok(order);
            }
            return self.load(order.id).await;
        }

        let approvers: Vec<User> = self
            .store
            .list_approvers()
            .await?
            .into_iter()
            .filter(|a| a.id != requester.id || self.policy.allows_self_approval(a.role))
            .collect();
        if let Err(e) = self.notifier.order_pending(&order, &approvers).await {
            warn!(order_id = %order.id, error = %e, "Approval notification failed");
        }
        Ok(order)
    }

    /// Approve a pending order
    #[instrument(skip(self, approver), fields(approver = %approver.id))]
    pub async fn approve(&self, order_id: Uuid, approver: &User) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        self.authorize_decision(&order, approver)?;
        check_transition(&order, OrderStatus::Approved)?;

        let previous = order.status;
        order.status = OrderStatus::Approved;
        order.approved_by = Some(approver.id);
        order.approved_at = Some(Utc::now());
        self.commit(&order, previous).await?;

        info!(order_id = %order.id, "Order approved");
        self.notify_resolved(&order).await;
        Ok(order)
    }

    /// Reject a pending order; a reason is required
    #[instrument(skip(self, approver, reason), fields(approver = %approver.id))]
    pub async fn reject(&self, order_id: Uuid, approver: &User, reason: &str) -> Result<Order> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::InvalidRequest("a rejection reason is required".into()));
        }

        let mut order = self.load(order_id).await?;
        self.authorize_decision(&order, approver)?;
        check_transition(&order, OrderStatus::Rejected)?;

        let previous = order.status;
        order.status = OrderStatus::Rejected;
        order.approved_by = Some(approver.id);
        order.rejection_reason = Some(reason.to_string());
        order.rejected_at = Some(Utc::now());
        self.commit(&order, previous).await?;

        info!(order_id = %order.id, "Order rejected");
        self.notify_resolved(&order).await;
        Ok(order)
    }

    /// Cancel an order that has not been placed yet. Only the requester
    /// may cancel.
    #[instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn cancel(&self, order_id: Uuid, requester: &User) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        if order.requested_by != requester.id {
            warn!(order_id = %order.id, "Cancellation by someone other than the requester");
            return Err(Error::Authorization(
                "only the requester can cancel an order".into(),
            ));
        }
        check_transition(&order, OrderStatus::Cancelled)?;

        let previous = order.status;
        order.status = OrderStatus::Cancelled;
        order.cancelled_at = Some(Utc::now());
        self.commit(&order, previous).await?;

        info!(order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    /// Record that fulfillment placed an approved order
    #[instrument(skip(self))]
    pub async fn mark_ordered(&self, order_id: Uuid, external_order_id: &str) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        check_transition(&order, OrderStatus::Ordered)?;

        let previous = order.status;
        order.status = OrderStatus::Ordered;
        order.external_order_id = Some(external_order_id.to_string());
        order.ordered_at = Some(Utc::now());
        self.commit(&order, previous).await?;

        info!(order_id = %order.id, "Order placed");
        Ok(order)
    }

    /// Record delivery of a placed order
    #[instrument(skip(self))]
    pub async fn mark_delivered(&self, order_id: Uuid) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        check_transition(&order, OrderStatus::Delivered)?;

        let previous = order.status;
        order.status = OrderStatus::Delivered;
        order.delivered_at = Some(Utc::now());
        self.commit(&order, previous).await?;

        info!(order_id = %order.id, "Order delivered");
        Ok(order)
    }

    /// Pending orders `approver` is allowed to decide, newest first
    pub async fn pending_for_approver(&self, approver: &User) -> Result<Vec<Order>> {
        if !approver.can_approve_orders {
            return Err(Error::Authorization(format!(
                "{} cannot approve orders",
                approver.name
            )));
        }
        let orders = self
            .store
            .list_orders(&OrderFilter::with_status(OrderStatus::Pending))
            .await?;
        Ok(orders
            .into_iter()
            .filter(|o| o.requested_by != approver.id || self.policy.allows_self_approval(approver.role))
            .collect())
    }

    /// Look up an order
    pub async fn get(&self, order_id: Uuid) -> Result<Order> {
        self.load(order_id).await
    }

    async fn load(&self, order_id: Uuid) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })
    }

    async fn within_own_limit(&self, requester: &User, amount: f64) -> Result<bool> {
        if requester.requires_approval {
            return Ok(false);
        }
        let start_of_day = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let spent = self
            .store
            .approved_spend_since(requester.id, start_of_day)
            .await?;
        Ok(spent + amount <= requester.daily_order_limit)
    }

    fn authorize_decision(&self, order: &Order, approver: &User) -> Result<()> {
        if !approver.can_approve_orders {
            warn!(order_id = %order.id, approver = %approver.id, role = %approver.role, "Approval attempt without permission");
            return Err(Error::Authorization(format!(
                "{} cannot approve orders",
                approver.name
            )));
        }
        if order.requested_by == approver.id && !self.policy.allows_self_approval(approver.role) {
            warn!(order_id = %order.id, approver = %approver.id, "Self-approval denied");
            return Err(Error::Authorization(
                "orders cannot be approved by the person who asked for them".into(),
            ));
        }
        Ok(())
    }

    /// Write `order` if the stored status is still `expected`
    async fn commit(&self, order: &Order, expected: OrderStatus) -> Result<()> {
        if self.store.update_order_if_status(order, expected).await? {
            return Ok(());
        }
        let current = self.load(order.id).await?;
        warn!(order_id = %order.id, from = %current.status, to = %order.status, "Concurrent order transition lost");
        Err(Error::InvalidTransition {
            order_id: order.id,
            from: current.status,
            to: order.status,
        })
    }

    async fn notify_resolved(&self, order: &Order) {
        if let Err(e) = self.notifier.order_resolved(order).await {
            warn!(order_id = %order.id, error = %e, "Resolution notification failed");
        }
    }
}

#[async_trait]
impl OrderGate for OrderWorkflow {
    async fn submit(
        &self,
        requester: &User,
        request: OrderRequest,
    ) -> jarvis_tools::Result<Order> {
        self.create(
            requester,
            request.target_user,
            request.order_type,
            request.items,
            request.platform,
        )
        .await
        .map_err(|e| match e {
            Error::InvalidRequest(msg) => jarvis_tools::Error::InvalidArgs(msg),
            Error::Store(store) => store.into(),
            other => jarvis_tools::Error::ExecutionFailed(other.to_string()),
        })
    }
}
