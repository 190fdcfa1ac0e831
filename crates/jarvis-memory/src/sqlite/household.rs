use super::{parse_enum, parse_opt_ts, parse_opt_uuid, parse_ts, parse_uuid, ts, SqliteStore};
use crate::error::Result;
use crate::store::ReminderFilter;
use crate::types::{GroceryItem, Priority, Reminder, ReminderCategory, RepeatPattern};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

const REMINDER_COLUMNS: &str = "id, user_id, message, remind_at, repeat_pattern, repeat_until,
     active, last_triggered, trigger_count, category, priority, created_at";

const GROCERY_COLUMNS: &str = "id, user_id, name, quantity, unit, category, added_by, purchased,
     notes, created_at, purchased_at";

impl SqliteStore {
    // ── Reminders ───────────────────────────────────────────────

    /// Insert a reminder.
    pub async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        sqlx::query(
            "INSERT INTO reminders
             (id, user_id, message, remind_at, repeat_pattern, repeat_until, active,
              last_triggered, trigger_count, category, priority, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(reminder.id.to_string())
        .bind(reminder.user_id.to_string())
        .bind(&reminder.message)
        .bind(ts(&reminder.remind_at))
        .bind(reminder.repeat.as_str())
        .bind(reminder.repeat_until.as_ref().map(ts))
        .bind(reminder.active)
        .bind(reminder.last_triggered.as_ref().map(ts))
        .bind(reminder.trigger_count)
        .bind(reminder.category.as_str())
        .bind(reminder.priority.as_str())
        .bind(ts(&reminder.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Reminders for a user, soonest first.
    pub async fn list_reminders(
        &self,
        user_id: Uuid,
        filter: &ReminderFilter,
    ) -> Result<Vec<Reminder>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE user_id = "));
        qb.push_bind(user_id.to_string());

        if filter.active_only {
            qb.push(" AND active = 1");
        }
        if let Some(from) = filter.from {
            qb.push(" AND remind_at >= ").push_bind(ts(&from));
        }
        if let Some(until) = filter.until {
            qb.push(" AND remind_at <= ").push_bind(ts(&until));
        }
        qb.push(" ORDER BY remind_at");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_reminder).collect()
    }

    pub(crate) fn row_to_reminder(row: &SqliteRow) -> Result<Reminder> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let remind_at: String = row.try_get("remind_at")?;
        let repeat: String = row.try_get("repeat_pattern")?;
        let category: String = row.try_get("category")?;
        let priority: String = row.try_get("priority")?;
        let created: String = row.try_get("created_at")?;

        Ok(Reminder {
            id: parse_uuid("reminders", &id)?,
            user_id: parse_uuid("reminders", &user_id)?,
            message: row.try_get("message")?,
            remind_at: parse_ts("reminders", &remind_at)?,
            repeat: parse_enum("reminders", &repeat, RepeatPattern::parse)?,
            repeat_until: parse_opt_ts("reminders", row.try_get("repeat_until")?)?,
            active: row.try_get("active")?,
            last_triggered: parse_opt_ts("reminders", row.try_get("last_triggered")?)?,
            trigger_count: row.try_get("trigger_count")?,
            category: parse_enum("reminders", &category, ReminderCategory::parse)?,
            priority: parse_enum("reminders", &priority, Priority::parse)?,
            created_at: parse_ts("reminders", &created)?,
        })
    }

    // ── Grocery list ────────────────────────────────────────────

    /// Add an item. An unpurchased item with the same name (case-insensitive)
    /// absorbs the quantity instead of creating a second row.
    pub async fn add_grocery_item(&self, item: &GroceryItem) -> Result<GroceryItem> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(&format!(
            "SELECT {GROCERY_COLUMNS} FROM grocery_list
             WHERE user_id = ?1 AND lower(name) = lower(?2) AND purchased = 0
             LIMIT 1"
        ))
        .bind(item.user_id.to_string())
        .bind(&item.name)
        .fetch_optional(&mut *tx)
        .await?;

        let stored = match existing {
            Some(row) => {
                let mut current = Self::row_to_grocery(&row)?;
                current.quantity += item.quantity;
                sqlx::query("UPDATE grocery_list SET quantity = ?2 WHERE id = ?1")
                    .bind(current.id.to_string())
                    .bind(current.quantity)
                    .execute(&mut *tx)
                    .await?;
                current
            }
            None => {
                sqlx::query(
                    "INSERT INTO grocery_list
                     (id, user_id, name, quantity, unit, category, added_by, purchased, notes,
                      created_at, purchased_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )
                .bind(item.id.to_string())
                .bind(item.user_id.to_string())
                .bind(&item.name)
                .bind(item.quantity)
                .bind(&item.unit)
                .bind(&item.category)
                .bind(item.added_by.map(|id| id.to_string()))
                .bind(item.purchased)
                .bind(&item.notes)
                .bind(ts(&item.created_at))
                .bind(item.purchased_at.as_ref().map(ts))
                .execute(&mut *tx)
                .await?;
                item.clone()
            }
        };

        tx.commit().await?;
        Ok(stored)
    }

    /// Items on a user's list, oldest first.
    pub async fn list_grocery_items(
        &self,
        user_id: Uuid,
        include_purchased: bool,
    ) -> Result<Vec<GroceryItem>> {
        let sql = if include_purchased {
            format!("SELECT {GROCERY_COLUMNS} FROM grocery_list WHERE user_id = ?1 ORDER BY created_at")
        } else {
            format!(
                "SELECT {GROCERY_COLUMNS} FROM grocery_list
                 WHERE user_id = ?1 AND purchased = 0 ORDER BY created_at"
            )
        };
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_grocery).collect()
    }

    /// Mark matching unpurchased items as bought.
    pub async fn mark_grocery_purchased(&self, user_id: Uuid, name: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE grocery_list SET purchased = 1, purchased_at = ?3
             WHERE user_id = ?1 AND lower(name) = lower(?2) AND purchased = 0",
        )
        .bind(user_id.to_string())
        .bind(name)
        .bind(ts(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub(crate) fn row_to_grocery(row: &SqliteRow) -> Result<GroceryItem> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let created: String = row.try_get("created_at")?;

        Ok(GroceryItem {
            id: parse_uuid("grocery_list", &id)?,
            user_id: parse_uuid("grocery_list", &user_id)?,
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            category: row.try_get("category")?,
            added_by: parse_opt_uuid("grocery_list", row.try_get("added_by")?)?,
            purchased: row.try_get("purchased")?,
            notes: row.try_get("notes")?,
            created_at: parse_ts("grocery_list", &created)?,
            purchased_at: parse_opt_ts("grocery_list", row.try_get("purchased_at")?)?,
        })
    }
}
