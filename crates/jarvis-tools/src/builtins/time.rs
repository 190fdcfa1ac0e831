//! Current date and time

use crate::context::ToolContext;
use crate::error::Result;
use crate::registry::{Tool, ToolDefinition, ToolOutput};
use chrono::{DateTime, Local, TimeZone};
use serde_json::{json, Value};

/// Current time tool
pub struct CurrentTimeTool {
    definition: ToolDefinition,
}

impl CurrentTimeTool {
    /// Create a new time tool
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: ToolDefinition::new(
                "get_current_time",
                "Get the current time and date. Use when the user asks what time or day it is.",
            ),
        }
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

/// "It's 03:15 PM on Monday, March 04"
pub(crate) fn describe_time<Tz: TimeZone>(now: &DateTime<Tz>) -> ToolOutput
where
    Tz::Offset: std::fmt::Display,
{
    let time = now.format("%I:%M %p").to_string();
    let date = now.format("%A, %B %d").to_string();
    ToolOutput::new(
        format!("It's {time} on {date}"),
        json!({
            "time": time,
            "date": date,
            "timestamp": now.to_rfc3339(),
        }),
    )
}

#[async_trait::async_trait]
impl Tool for CurrentTimeTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<ToolOutput> {
        Ok(describe_time(&Local::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_voice_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 15, 15, 0).unwrap();
        let out = describe_time(&now);
        assert_eq!(out.message, "It's 03:15 PM on Monday, March 04");
        assert_eq!(out.data["time"], "03:15 PM");
    }
}
