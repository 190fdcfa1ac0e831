//! Builtins - Household tools
//!
//! - Information: get_current_time, calculator, get_weather
//! - Reminders: set_reminder, get_reminders
//! - Grocery: add_to_grocery_list, view_grocery_list, mark_grocery_purchased
//! - Orders: create_order_request

mod calculator;
mod grocery;
mod orders;
mod reminders;
mod time;
mod weather;

pub use calculator::{evaluate, CalculatorTool};
pub use grocery::{AddToGroceryListTool, MarkGroceryPurchasedTool, ViewGroceryListTool};
pub use orders::CreateOrderRequestTool;
pub use reminders::{parse_when, GetRemindersTool, SetReminderTool};
pub use time::CurrentTimeTool;
pub use weather::{WeatherTool, DEFAULT_WEATHER_URL};

use crate::registry::ToolRegistry;
use std::sync::Arc;

/// Configuration for built-in tools
#[derive(Debug, Clone, Default)]
pub struct BuiltinsConfig {
    /// OpenWeather API key
    pub weather_api_key: Option<String>,
}

/// Register all built-in tools with the registry (default config)
pub fn register_builtins(registry: &mut ToolRegistry) {
    register_builtins_with_config(registry, &BuiltinsConfig::default());
}

/// Register all built-in tools with custom configuration
pub fn register_builtins_with_config(registry: &mut ToolRegistry, config: &BuiltinsConfig) {
    registry.register(Arc::new(CurrentTimeTool::new()));
    registry.register(Arc::new(CalculatorTool::new()));
    registry.register(Arc::new(WeatherTool::new(config.weather_api_key.clone())));

    registry.register(Arc::new(SetReminderTool::new()));
    registry.register(Arc::new(GetRemindersTool::new()));

    registry.register(Arc::new(AddToGroceryListTool::new()));
    registry.register(Arc::new(ViewGroceryListTool::new()));
    registry.register(Arc::new(MarkGroceryPurchasedTool::new()));

    registry.register(Arc::new(CreateOrderRequestTool::new()));
}
