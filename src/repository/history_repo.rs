//! History repository (变更历史数据访问)

use crate::models::history::{HistoryEntry, NewHistoryEntry};
use sqlx::PgExecutor;

/// 追加历史条目
///
/// occurred_at 取当前时钟与表内最大值中的较大者，保证按插入顺序不递减。
pub async fn append<'e, E>(executor: E, entry: &NewHistoryEntry) -> Result<HistoryEntry, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, HistoryEntry>(
        r#"
        INSERT INTO device_history (
            device_id, action, field_name, old_value, new_value, actor, description, occurred_at
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            GREATEST(
                clock_timestamp(),
                COALESCE((SELECT MAX(occurred_at) FROM device_history), clock_timestamp())
            )
        )
        RETURNING *
        "#,
    )
    .bind(entry.device_id)
    .bind(entry.action.as_str())
    .bind(&entry.field_name)
    .bind(&entry.old_value)
    .bind(&entry.new_value)
    .bind(&entry.actor)
    .bind(&entry.description)
    .fetch_one(executor)
    .await
}

/// 查询单个设备的历史
pub async fn for_device<'e, E>(executor: E, device_id: i64) -> Result<Vec<HistoryEntry>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, HistoryEntry>(
        "SELECT * FROM device_history WHERE device_id = $1 ORDER BY occurred_at DESC, id DESC",
    )
    .bind(device_id)
    .fetch_all(executor)
    .await
}

/// 查询全部历史
pub async fn list<'e, E>(executor: E, offset: i64, limit: i64) -> Result<Vec<HistoryEntry>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, HistoryEntry>(
        "SELECT * FROM device_history ORDER BY occurred_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}
