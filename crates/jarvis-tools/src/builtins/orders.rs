//! Order request tool
//!
//! Hands the request to the order workflow and reports what happened. The
//! tool itself never decides on approval.

use crate::context::{OrderRequest, ToolContext};
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolOutput};
use crate::schema::ParamSchema;
use jarvis_memory::{OrderItem, OrderStatus, OrderType, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
struct CreateOrderInput {
    order_type: String,
    items: Vec<ItemInput>,
    #[serde(default)]
    platform: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemInput {
    name: String,
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
    estimated_price: f64,
}

/// Create order request tool
pub struct CreateOrderRequestTool {
    definition: ToolDefinition,
}

impl CreateOrderRequestTool {
    /// Create a new create_order_request tool
    #[must_use]
    pub fn new() -> Self {
        let item = ParamSchema::object()
            .required_property("name", ParamSchema::string())
            .required_property("quantity", ParamSchema::number())
            .property("unit", ParamSchema::string())
            .required_property(
                "estimated_price",
                ParamSchema::number().describe("Estimated price per unit in rupees"),
            );

        let definition = ToolDefinition::new(
            "create_order_request",
            "Create an order request for groceries or medicines. It is sent for approval.",
        )
        .with_parameters(
            ParamSchema::object()
                .required_property(
                    "order_type",
                    ParamSchema::string_enum(&["grocery", "medicine", "other"]),
                )
                .required_property("items", ParamSchema::array(item).describe("Items to order"))
                .property(
                    "platform",
                    ParamSchema::string().describe("Where to order from, e.g. 'zepto', 'bigbasket'"),
                ),
        )
        .deny_roles(&[Role::Child, Role::Guest]);
        Self { definition }
    }
}

impl Default for CreateOrderRequestTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for CreateOrderRequestTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let input: CreateOrderInput = serde_json::from_value(args)
            .map_err(|e| Error::InvalidArgs(format!("order request: {e}")))?;
        if input.items.is_empty() {
            return Err(Error::InvalidArgs("$.items: at least one item is required".into()));
        }
        if let Some(bad) = input
            .items
            .iter()
            .find(|i| i.quantity <= 0.0 || i.estimated_price < 0.0)
        {
            return Err(Error::InvalidArgs(format!(
                "'{}' needs a positive quantity and a non-negative price",
                bad.name
            )));
        }

        let order_type = OrderType::parse(&input.order_type).unwrap_or(OrderType::Other);
        let items = input
            .items
            .into_iter()
            .map(|i| OrderItem {
                name: i.name,
                quantity: i.quantity,
                unit: i.unit,
                estimated_price: i.estimated_price,
                notes: None,
            })
            .collect();

        let request = OrderRequest {
            target_user: ctx.user.id,
            order_type,
            items,
            platform: input.platform,
        };
        let order = ctx.orders.submit(&ctx.user, request).await?;
        info!(order_id = %order.id, status = %order.status, total = order.total_amount, "Order request submitted");

        let outcome = match order.status {
            OrderStatus::Approved => "Approved automatically.",
            _ => "Waiting for approval.",
        };
        Ok(ToolOutput::new(
            format!(
                "Order request created for {} (estimated ₹{:.0}). {outcome}",
                order.item_summary(),
                order.total_amount
            ),
            json!({
                "order_id": order.id,
                "total": order.total_amount,
                "status": order.status.as_str(),
            }),
        ))
    }
}
