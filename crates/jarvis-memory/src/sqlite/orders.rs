use super::{opt_ts, parse_enum, parse_opt_ts, parse_opt_uuid, parse_ts, parse_uuid, ts, SqliteStore};
use crate::error::Result;
use crate::store::OrderFilter;
use crate::types::{Order, OrderItem, OrderStatus, OrderType};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, requested_by, approved_by, order_type, items,
     total_amount, platform, status, rejection_reason, external_order_id, created_at,
     approved_at, rejected_at, ordered_at, delivered_at, cancelled_at";

impl SqliteStore {
    // ── Orders ──────────────────────────────────────────────────

    /// Insert an order.
    pub async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders
             (id, user_id, requested_by, approved_by, order_type, items, total_amount, platform,
              status, rejection_reason, external_order_id, created_at, approved_at, rejected_at,
              ordered_at, delivered_at, cancelled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(order.requested_by.to_string())
        .bind(order.approved_by.map(|id| id.to_string()))
        .bind(order.order_type.as_str())
        .bind(serde_json::to_string(&order.items)?)
        .bind(order.total_amount)
        .bind(&order.platform)
        .bind(order.status.as_str())
        .bind(&order.rejection_reason)
        .bind(&order.external_order_id)
        .bind(ts(&order.created_at))
        .bind(opt_ts(order.approved_at.as_ref()))
        .bind(opt_ts(order.rejected_at.as_ref()))
        .bind(opt_ts(order.ordered_at.as_ref()))
        .bind(opt_ts(order.delivered_at.as_ref()))
        .bind(opt_ts(order.cancelled_at.as_ref()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get an order by ID.
    pub async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    /// Compare-and-set: write the mutable columns only if the stored status
    /// is still `expected`.
    pub async fn update_order_if_status(&self, order: &Order, expected: OrderStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET
                status = ?3, approved_by = ?4, rejection_reason = ?5, external_order_id = ?6,
                approved_at = ?7, rejected_at = ?8, ordered_at = ?9, delivered_at = ?10,
                cancelled_at = ?11
             WHERE id = ?1 AND status = ?2",
        )
        .bind(order.id.to_string())
        .bind(expected.as_str())
        .bind(order.status.as_str())
        .bind(order.approved_by.map(|id| id.to_string()))
        .bind(&order.rejection_reason)
        .bind(&order.external_order_id)
        .bind(opt_ts(order.approved_at.as_ref()))
        .bind(opt_ts(order.rejected_at.as_ref()))
        .bind(opt_ts(order.ordered_at.as_ref()))
        .bind(opt_ts(order.delivered_at.as_ref()))
        .bind(opt_ts(order.cancelled_at.as_ref()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Orders matching a filter, newest first.
    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));

        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id.to_string());
        }
        if let Some(requested_by) = filter.requested_by {
            qb.push(" AND requested_by = ").push_bind(requested_by.to_string());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_order).collect()
    }

    /// Total of approved, ordered or delivered orders approved since `since`.
    pub async fn approved_spend_since(&self, requested_by: Uuid, since: DateTime<Utc>) -> Result<f64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(total_amount), 0.0) AS spent FROM orders
             WHERE requested_by = ?1
               AND status IN ('approved', 'ordered', 'delivered')
               AND approved_at >= ?2",
        )
        .bind(requested_by.to_string())
        .bind(ts(&since))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("spent")?)
    }

    pub(crate) fn row_to_order(row: &SqliteRow) -> Result<Order> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let requested_by: String = row.try_get("requested_by")?;
        let order_type: String = row.try_get("order_type")?;
        let status: String = row.try_get("status")?;
        let items: String = row.try_get("items")?;
        let created: String = row.try_get("created_at")?;

        Ok(Order {
            id: parse_uuid("orders", &id)?,
            user_id: parse_uuid("orders", &user_id)?,
            requested_by: parse_uuid("orders", &requested_by)?,
            approved_by: parse_opt_uuid("orders", row.try_get("approved_by")?)?,
            order_type: parse_enum("orders", &order_type, OrderType::parse)?,
            items: serde_json::from_str::<Vec<OrderItem>>(&items)?,
            total_amount: row.try_get("total_amount")?,
            platform: row.try_get("platform")?,
            status: parse_enum("orders", &status, OrderStatus::parse)?,
            rejection_reason: row.try_get("rejection_reason")?,
            external_order_id: row.try_get("external_order_id")?,
            created_at: parse_ts("orders", &created)?,
            approved_at: parse_opt_ts("orders", row.try_get("approved_at")?)?,
            rejected_at: parse_opt_ts("orders", row.try_get("rejected_at")?)?,
            ordered_at: parse_opt_ts("orders", row.try_get("ordered_at")?)?,
            delivered_at: parse_opt_ts("orders", row.try_get("delivered_at")?)?,
            cancelled_at: parse_opt_ts("orders", row.try_get("cancelled_at")?)?,
        })
    }
}
