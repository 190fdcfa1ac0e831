use super::{opt_ts, parse_enum, parse_opt_ts, parse_ts, parse_uuid, ts, SqliteStore};
use crate::error::{Error, Result};
use crate::types::{MedicalInfo, Role, User};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, identity, name, role, age, language, response_length,
     daily_order_limit, requires_approval, can_approve_orders, medical_info,
     total_conversations, last_interaction, created_at, updated_at";

impl SqliteStore {
    // ── Users ───────────────────────────────────────────────────

    /// Insert a user. Fails if the identity is already taken.
    pub async fn create_user(&self, user: &User) -> Result<()> {
        let medical = user
            .medical_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT INTO users
             (id, identity, name, role, age, language, response_length, daily_order_limit,
              requires_approval, can_approve_orders, medical_info, total_conversations,
              last_interaction, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(user.id.to_string())
        .bind(&user.identity)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.age.map(i64::from))
        .bind(&user.language)
        .bind(&user.response_length)
        .bind(user.daily_order_limit)
        .bind(user.requires_approval)
        .bind(user.can_approve_orders)
        .bind(medical)
        .bind(user.total_conversations)
        .bind(opt_ts(user.last_interaction.as_ref()))
        .bind(ts(&user.created_at))
        .bind(ts(&user.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a user by internal ID.
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by external identity.
    pub async fn get_user_by_identity(&self, identity: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE identity = ?1"
        ))
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Overwrite profile fields. Counters are left alone.
    pub async fn update_user(&self, user: &User) -> Result<()> {
        let medical = user
            .medical_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            "UPDATE users SET
                name = ?2, role = ?3, age = ?4, language = ?5, response_length = ?6,
                daily_order_limit = ?7, requires_approval = ?8, can_approve_orders = ?9,
                medical_info = ?10, updated_at = ?11
             WHERE id = ?1",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.age.map(i64::from))
        .bind(&user.language)
        .bind(&user.response_length)
        .bind(user.daily_order_limit)
        .bind(user.requires_approval)
        .bind(user.can_approve_orders)
        .bind(medical)
        .bind(ts(&Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                entity: "user",
                id: user.id.to_string(),
            });
        }
        Ok(())
    }

    /// Record an interaction now.
    pub async fn touch_user(&self, id: Uuid, new_conversation: bool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET
                last_interaction = ?2,
                total_conversations = total_conversations + ?3
             WHERE id = ?1",
        )
        .bind(id.to_string())
        .bind(ts(&Utc::now()))
        .bind(i64::from(new_conversation))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Users who can approve orders.
    pub async fn list_approvers(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE can_approve_orders = 1 ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    pub(crate) fn row_to_user(row: &SqliteRow) -> Result<User> {
        let id: String = row.try_get("id")?;
        let role: String = row.try_get("role")?;
        let medical: Option<String> = row.try_get("medical_info")?;
        let age: Option<i64> = row.try_get("age")?;
        let created: String = row.try_get("created_at")?;
        let updated: String = row.try_get("updated_at")?;

        Ok(User {
            id: parse_uuid("users", &id)?,
            identity: row.try_get("identity")?,
            name: row.try_get("name")?,
            role: parse_enum("users", &role, Role::parse)?,
            age: age.and_then(|a| u32::try_from(a).ok()),
            language: row.try_get("language")?,
            response_length: row.try_get("response_length")?,
            daily_order_limit: row.try_get("daily_order_limit")?,
            requires_approval: row.try_get("requires_approval")?,
            can_approve_orders: row.try_get("can_approve_orders")?,
            medical_info: medical
                .map(|m| serde_json::from_str::<MedicalInfo>(&m))
                .transpose()?,
            total_conversations: row.try_get("total_conversations")?,
            last_interaction: parse_opt_ts("users", row.try_get("last_interaction")?)?,
            created_at: parse_ts("users", &created)?,
            updated_at: parse_ts("users", &updated)?,
        })
    }
}
