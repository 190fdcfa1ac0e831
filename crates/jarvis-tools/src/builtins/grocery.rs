//! Grocery list tools

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolOutput};
use crate::schema::ParamSchema;
use jarvis_memory::{GroceryItem, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct AddInput {
    items: Vec<ItemInput>,
}

#[derive(Debug, Deserialize)]
struct ItemInput {
    name: String,
    #[serde(default)]
    quantity: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

fn quantity_label(item: &GroceryItem) -> String {
    let qty = if item.quantity.fract() == 0.0 {
        format!("{:.0}", item.quantity)
    } else {
        item.quantity.to_string()
    };
    match &item.unit {
        Some(unit) => format!("{qty} {unit}"),
        None => qty,
    }
}

/// Add items to the grocery list
pub struct AddToGroceryListTool {
    definition: ToolDefinition,
}

impl AddToGroceryListTool {
    /// Create a new add_to_grocery_list tool
    #[must_use]
    pub fn new() -> Self {
        let item = ParamSchema::object()
            .required_property("name", ParamSchema::string())
            .property("quantity", ParamSchema::number())
            .property("unit", ParamSchema::string())
            .property("category", ParamSchema::string());
        let definition =
            ToolDefinition::new("add_to_grocery_list", "Add items to the household grocery list")
                .with_parameters(ParamSchema::object().required_property(
                    "items",
                    ParamSchema::array(item).describe("List of items to add"),
                ))
                .deny_roles(&[Role::Guest]);
        Self { definition }
    }
}

impl Default for AddToGroceryListTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for AddToGroceryListTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let input: AddInput = serde_json::from_value(args)
            .map_err(|e| Error::InvalidArgs(format!("grocery items: {e}")))?;
        if input.items.is_empty() {
            return Err(Error::InvalidArgs("$.items: at least one item is required".into()));
        }

        let mut added = Vec::with_capacity(input.items.len());
        for entry in input.items {
            let mut item = GroceryItem::new(ctx.user.id, entry.name.trim(), entry.quantity.unwrap_or(1.0));
            item.unit = entry.unit;
            item.category = entry.category;
            item.added_by = Some(ctx.user.id);

            let stored = ctx.store.add_grocery_item(&item).await?;
            debug!(item = %stored.name, quantity = stored.quantity, "Grocery item stored");
            added.push(stored.name);
        }

        Ok(ToolOutput::new(
            format!(
                "Added {} item(s) to grocery list: {}",
                added.len(),
                added.join(", ")
            ),
            json!({ "added": added }),
        ))
    }
}

/// Read the grocery list
pub struct ViewGroceryListTool {
    definition: ToolDefinition,
}

impl ViewGroceryListTool {
    /// Create a new view_grocery_list tool
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: ToolDefinition::new("view_grocery_list", "View the current grocery list"),
        }
    }
}

impl Default for ViewGroceryListTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for ViewGroceryListTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let items = ctx.store.list_grocery_items(ctx.user.id, false).await?;
        if items.is_empty() {
            return Ok(ToolOutput::new("The grocery list is empty", json!({ "items": [] })));
        }

        let spoken: Vec<String> = items
            .iter()
            .map(|i| format!("{} ({})", i.name, quantity_label(i)))
            .collect();
        let data: Vec<Value> = items
            .iter()
            .map(|i| json!({ "name": i.name, "quantity": quantity_label(i) }))
            .collect();

        Ok(ToolOutput::new(
            format!("Grocery list has {} items: {}", items.len(), spoken.join(", ")),
            json!({ "items": data }),
        ))
    }
}

/// Tick an item off the grocery list
pub struct MarkGroceryPurchasedTool {
    definition: ToolDefinition,
}

impl MarkGroceryPurchasedTool {
    /// Create a new mark_grocery_purchased tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "mark_grocery_purchased",
            "Mark an item on the grocery list as bought",
        )
        .with_parameters(
            ParamSchema::object()
                .required_property("name", ParamSchema::string().describe("Item name")),
        )
        .deny_roles(&[Role::Guest]);
        Self { definition }
    }
}

impl Default for MarkGroceryPurchasedTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for MarkGroceryPurchasedTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let name = args["name"].as_str().unwrap_or_default().trim();
        let updated = ctx.store.mark_grocery_purchased(ctx.user.id, name).await?;

        let message = if updated == 0 {
            format!("{name} wasn't on the grocery list")
        } else {
            format!("Marked {name} as purchased")
        };
        Ok(ToolOutput::new(message, json!({ "name": name, "updated": updated })))
    }
}
