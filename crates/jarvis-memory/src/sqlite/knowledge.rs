use super::{parse_enum, parse_opt_uuid, parse_ts, parse_uuid, ts, SqliteStore};
use crate::error::{Error, Result};
use crate::types::{Fact, FactCategory, Importance, Preference, PreferenceObservation};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const FACT_COLUMNS: &str = "id, user_id, text, category, importance, source_conversation_id,
     reference_count, created_at, last_referenced";

const PREFERENCE_COLUMNS: &str = "id, user_id, category, key, value, confidence,
     source_conversation_id, created_at, updated_at";

impl SqliteStore {
    // ── Facts ───────────────────────────────────────────────────

    /// Insert a fact.
    pub async fn insert_fact(&self, fact: &Fact) -> Result<()> {
        sqlx::query(
            "INSERT INTO facts
             (id, user_id, text, category, importance, source_conversation_id,
              reference_count, created_at, last_referenced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(fact.id.to_string())
        .bind(fact.user_id.to_string())
        .bind(&fact.text)
        .bind(fact.category.as_str())
        .bind(fact.importance.as_str())
        .bind(fact.source_conversation_id.map(|id| id.to_string()))
        .bind(fact.reference_count)
        .bind(ts(&fact.created_at))
        .bind(ts(&fact.last_referenced))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All facts for a user, most recently referenced first.
    pub async fn list_facts(&self, user_id: Uuid) -> Result<Vec<Fact>> {
        let rows = sqlx::query(&format!(
            "SELECT {FACT_COLUMNS} FROM facts WHERE user_id = ?1
             ORDER BY last_referenced DESC, created_at DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_fact).collect()
    }

    /// Bump `reference_count` in a single statement, optionally raising importance.
    pub async fn increment_fact_reference(
        &self,
        fact_id: Uuid,
        raise_to: Option<Importance>,
    ) -> Result<Fact> {
        let result = sqlx::query(
            "UPDATE facts SET
                reference_count = reference_count + 1,
                last_referenced = ?2,
                importance = COALESCE(?3, importance)
             WHERE id = ?1",
        )
        .bind(fact_id.to_string())
        .bind(ts(&Utc::now()))
        .bind(raise_to.map(|i| i.as_str()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                entity: "fact",
                id: fact_id.to_string(),
            });
        }

        let row = sqlx::query(&format!("SELECT {FACT_COLUMNS} FROM facts WHERE id = ?1"))
            .bind(fact_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Self::row_to_fact(&row)
    }

    pub(crate) fn row_to_fact(row: &SqliteRow) -> Result<Fact> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let category: String = row.try_get("category")?;
        let importance: String = row.try_get("importance")?;
        let created: String = row.try_get("created_at")?;
        let referenced: String = row.try_get("last_referenced")?;

        Ok(Fact {
            id: parse_uuid("facts", &id)?,
            user_id: parse_uuid("facts", &user_id)?,
            text: row.try_get("text")?,
            category: FactCategory::from_str_lossy(&category),
            importance: parse_enum("facts", &importance, Importance::parse)?,
            source_conversation_id: parse_opt_uuid(
                "facts",
                row.try_get("source_conversation_id")?,
            )?,
            reference_count: row.try_get("reference_count")?,
            created_at: parse_ts("facts", &created)?,
            last_referenced: parse_ts("facts", &referenced)?,
        })
    }

    // ── Preferences ─────────────────────────────────────────────

    /// Merge an observation into the (user, category, key) row in one statement.
    ///
    /// SQLite evaluates every `SET` expression against the pre-update row,
    /// so `value` inside the `CASE` is the stored value.
    pub async fn upsert_preference(&self, obs: &PreferenceObservation) -> Result<Preference> {
        let now = ts(&Utc::now());
        let confidence = obs.confidence.clamp(0.0, 1.0);

        sqlx::query(
            "INSERT INTO preferences
             (id, user_id, category, key, value, confidence, source_conversation_id,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(user_id, category, key) DO UPDATE SET
                value = excluded.value,
                confidence = MAX(confidence, excluded.confidence),
                source_conversation_id = COALESCE(excluded.source_conversation_id,
                                                  source_conversation_id),
                updated_at = CASE WHEN value <> excluded.value
                                  THEN excluded.updated_at ELSE updated_at END",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(obs.user_id.to_string())
        .bind(&obs.category)
        .bind(&obs.key)
        .bind(&obs.value)
        .bind(confidence)
        .bind(obs.source_conversation_id.map(|id| id.to_string()))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_preference(obs.user_id, &obs.category, &obs.key)
            .await?
            .ok_or_else(|| Error::Internal("preference vanished after upsert".to_string()))
    }

    /// Look up one preference.
    pub async fn get_preference(
        &self,
        user_id: Uuid,
        category: &str,
        key: &str,
    ) -> Result<Option<Preference>> {
        let row = sqlx::query(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM preferences
             WHERE user_id = ?1 AND category = ?2 AND key = ?3"
        ))
        .bind(user_id.to_string())
        .bind(category)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_preference).transpose()
    }

    /// All preferences for a user.
    pub async fn list_preferences(&self, user_id: Uuid) -> Result<Vec<Preference>> {
        let rows = sqlx::query(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM preferences WHERE user_id = ?1
             ORDER BY category, key"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_preference).collect()
    }

    pub(crate) fn row_to_preference(row: &SqliteRow) -> Result<Preference> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let created: String = row.try_get("created_at")?;
        let updated: String = row.try_get("updated_at")?;

        Ok(Preference {
            id: parse_uuid("preferences", &id)?,
            user_id: parse_uuid("preferences", &user_id)?,
            category: row.try_get("category")?,
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            confidence: row.try_get("confidence")?,
            source_conversation_id: parse_opt_uuid(
                "preferences",
                row.try_get("source_conversation_id")?,
            )?,
            created_at: parse_ts("preferences", &created)?,
            updated_at: parse_ts("preferences", &updated)?,
        })
    }
}
