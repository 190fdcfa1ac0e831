use crate::error::{Error, Result};
use jarvis_memory::{Order, OrderStatus, Role};

/// Who may approve their own orders
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    /// Roles allowed to approve orders they requested themselves
    pub allow_self_approval_roles: Vec<Role>,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            allow_self_approval_roles: vec![Role::Adult],
        }
    }
}

impl ApprovalPolicy {
    /// Set the roles allowed to self-approve
    #[must_use]
    pub fn with_self_approval_roles(mut self, roles: &[Role]) -> Self {
        self.allow_self_approval_roles = roles.to_vec();
        self
    }

    /// Whether a user with `role` may approve their own order
    #[must_use]
    pub fn allows_self_approval(&self, role: Role) -> bool {
        self.allow_self_approval_roles.contains(&role)
    }
}

/// Whether `from → to` is one of the legal order transitions
#[must_use]
pub fn is_legal_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::{Approved, Cancelled, Delivered, Ordered, Pending, Rejected};
    matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Rejected)
            | (Pending, Cancelled)
            | (Approved, Ordered)
            | (Approved, Cancelled)
            | (Ordered, Delivered)
    )
}

/// Fail with [`Error::InvalidTransition`] unless `order` may move to `to`
pub fn check_transition(order: &Order, to: OrderStatus) -> Result<()> {
    if is_legal_transition(order.status, to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            order_id: order.id,
            from: order.status,
            to,
        })
    }
}
