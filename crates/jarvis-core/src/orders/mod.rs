//! Order Workflow - approval state machine for purchases
//!
//! ```text
//!            ┌──► approved ──► ordered ──► delivered
//! pending ───┤        │
//!            ├──► rejected
//!            └──► cancelled ◄── (pending | approved, requester only)
//! ```
//!
//! Every transition is written with a compare-and-set on the previous
//! status, so two concurrent decisions on the same order cannot both win.

mod notifier;
mod policy;
mod workflow;


pub use notifier::{ApprovalNotifier, LogNotifier};
pub use policy::{check_transition, is_legal_transition, ApprovalPolicy};
pub use workflow::OrderWorkflow;

#[cfg(test)]
pub(crate) use notifier::MockApprovalNotifier;
