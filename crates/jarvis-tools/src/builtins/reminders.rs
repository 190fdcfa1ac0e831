//! Reminder tools
//!
//! The core only creates and reads reminders. Firing them is left to an
//! external scheduler.

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolOutput};
use crate::schema::ParamSchema;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use jarvis_memory::{Priority, Reminder, ReminderCategory, ReminderFilter, RepeatPattern};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;
use tracing::info;

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+|an?)\s*(minute|min|hour|hr|day)s?\b")
        .expect("RELATIVE is a compile-time constant")
});

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?")
        .expect("CLOCK is a compile-time constant")
});

const DEFAULT_HOURS_AHEAD: i64 = 24;
const MAX_HOURS_AHEAD: i64 = 24 * 31;

/// Resolve a spoken time ("in 30 minutes", "tomorrow at 9am", "5pm") against `now`.
///
/// A bare clock time that has already passed today rolls to tomorrow;
/// "tomorrow" without a clock time means 9 AM.
pub fn parse_when<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let text = input.trim().to_lowercase();

    if let Some(caps) = RELATIVE.captures(&text) {
        let amount = match &caps[1] {
            "a" | "an" => 1,
            digits => digits.parse::<i64>().ok()?,
        };
        let delta = match &caps[2] {
            "minute" | "min" => Duration::minutes(amount),
            "hour" | "hr" => Duration::hours(amount),
            _ => Duration::days(amount),
        };
        return Some(now.clone() + delta);
    }

    let clock = CLOCK.captures(&text).map(|caps| {
        clock_time(
            &caps[1],
            caps.get(2).map(|m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
        )
    });

    let today = now.date_naive();
    if text.contains("tomorrow") {
        let (hour, minute) = match clock {
            Some(parsed) => parsed?,
            None => (9, 0),
        };
        return at(now, today.succ_opt()?, hour, minute);
    }

    let (hour, minute) = clock??;
    let candidate = at(now, today, hour, minute)?;
    if candidate <= *now {
        return at(now, today.succ_opt()?, hour, minute);
    }
    Some(candidate)
}

fn clock_time(hour: &str, minute: Option<&str>, period: Option<&str>) -> Option<(u32, u32)> {
    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.map_or(Some(0), |m| m.parse().ok())?;
    if minute > 59 {
        return None;
    }
    match period.map(|p| p.replace('.', "")) {
        Some(p) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            if p == "pm" && hour != 12 {
                hour += 12;
            } else if p == "am" && hour == 12 {
                hour = 0;
            }
        }
        None if hour > 23 => return None,
        None => {}
    }
    Some((hour, minute))
}

fn at<Tz: TimeZone>(now: &DateTime<Tz>, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    now.timezone().from_local_datetime(&naive).earliest()
}

/// Set reminder tool
pub struct SetReminderTool {
    definition: ToolDefinition,
}

impl SetReminderTool {
    /// Create a new set_reminder tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new(
            "set_reminder",
            "Set a reminder for the user. Use when they want to be reminded about something.",
        )
        .with_parameters(
            ParamSchema::object()
                .required_property("message", ParamSchema::string().describe("What to remind about"))
                .required_property(
                    "time",
                    ParamSchema::string().describe(
                        "When to remind: relative ('in 30 minutes', 'tomorrow at 9am') or absolute ('5pm', '8:00 PM')",
                    ),
                )
                .property(
                    "repeat",
                    ParamSchema::string_enum(&["none", "daily", "weekly"]),
                )
                .property(
                    "category",
                    ParamSchema::string_enum(&["medicine", "task", "event", "other"]),
                ),
        );
        Self { definition }
    }

    async fn create(&self, args: &Value, ctx: &ToolContext, now: DateTime<Local>) -> Result<ToolOutput> {
        let message = args["message"].as_str().unwrap_or_default().trim();
        let time = args["time"].as_str().unwrap_or_default();
        if message.is_empty() {
            return Err(Error::InvalidArgs("$.message: must not be empty".into()));
        }

        let when = parse_when(time, &now)
            .ok_or_else(|| Error::InvalidArgs(format!("could not understand time '{time}'")))?;
        if when <= now {
            return Err(Error::InvalidArgs("cannot set a reminder in the past".into()));
        }

        let repeat = args["repeat"]
            .as_str()
            .and_then(RepeatPattern::parse)
            .unwrap_or_default();
        let category = args["category"]
            .as_str()
            .and_then(ReminderCategory::parse)
            .unwrap_or_default();

        let mut reminder = Reminder::new(ctx.user.id, message, when.with_timezone(&Utc))
            .with_repeat(repeat)
            .with_category(category);
        if category == ReminderCategory::Medicine {
            reminder.priority = Priority::High;
        }
        ctx.store.insert_reminder(&reminder).await?;
        info!(user = %ctx.user.identity, remind_at = %reminder.remind_at, "Reminder created");

        let spoken = when.format("%I:%M %p on %B %d");
        Ok(ToolOutput::new(
            format!("Reminder set for {spoken}: {message}"),
            json!({
                "reminder_id": reminder.id,
                "message": message,
                "remind_at": reminder.remind_at.to_rfc3339(),
                "repeat": repeat.as_str(),
            }),
        ))
    }
}

impl Default for SetReminderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for SetReminderTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        self.create(&args, ctx, Local::now()).await
    }
}

/// Upcoming reminders tool
pub struct GetRemindersTool {
    definition: ToolDefinition,
}

impl GetRemindersTool {
    /// Create a new get_reminders tool
    #[must_use]
    pub fn new() -> Self {
        let definition = ToolDefinition::new("get_reminders", "Get upcoming reminders for the user")
            .with_parameters(ParamSchema::object().property(
                "hours_ahead",
                ParamSchema::integer().describe("How many hours ahead to look (default 24)"),
            ));
        Self { definition }
    }
}

impl Default for GetRemindersTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GetRemindersTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolOutput> {
        let hours = args["hours_ahead"]
            .as_f64()
            .map_or(DEFAULT_HOURS_AHEAD, |h| h as i64)
            .clamp(1, MAX_HOURS_AHEAD);

        let now = Utc::now();
        let filter = ReminderFilter {
            active_only: true,
            from: Some(now),
            until: Some(now + Duration::hours(hours)),
        };
        let reminders = ctx.store.list_reminders(ctx.user.id, &filter).await?;

        if reminders.is_empty() {
            return Ok(ToolOutput::new("No upcoming reminders", json!({ "reminders": [] })));
        }

        let list: Vec<Value> = reminders
            .iter()
            .map(|r| {
                json!({
                    "message": r.message,
                    "time": r.remind_at.with_timezone(&Local).format("%I:%M %p").to_string(),
                    "category": r.category.as_str(),
                })
            })
            .collect();

        Ok(ToolOutput::new(
            format!("You have {} upcoming reminder(s)", reminders.len()),
            json!({ "reminders": list }),
        ))
    }
}
