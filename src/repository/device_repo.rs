//! Device repository (设备数据访问)
//!
//! 查询函数对执行器泛型，既可在连接池上执行，也可在事务内执行。

use crate::models::device::{DeviceRecord, NewDevice};
use sqlx::PgExecutor;

/// 获取设备
pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<DeviceRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DeviceRecord>("SELECT * FROM devices WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// 获取设备并加行锁，同一设备的并发更新在此串行化
pub async fn find_by_id_for_update<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<DeviceRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DeviceRecord>("SELECT * FROM devices WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// 根据硬件地址获取设备
pub async fn find_by_hardware_address<'e, E>(
    executor: E,
    hardware_address: &str,
) -> Result<Option<DeviceRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DeviceRecord>("SELECT * FROM devices WHERE hardware_address = $1")
        .bind(hardware_address)
        .fetch_optional(executor)
        .await
}

/// 列出设备
pub async fn list<'e, E>(executor: E, offset: i64, limit: i64) -> Result<Vec<DeviceRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DeviceRecord>("SELECT * FROM devices ORDER BY id LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}

/// 搜索设备，`pattern` 为已转义的 LIKE 模式
pub async fn search<'e, E>(executor: E, pattern: &str) -> Result<Vec<DeviceRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DeviceRecord>(
        r#"
        SELECT * FROM devices
        WHERE hardware_address ILIKE $1
           OR network_address ILIKE $1
           OR primary_info ILIKE $1
           OR process_info ILIKE $1
           OR last_modified_by ILIKE $1
           OR note ILIKE $1
        ORDER BY id
        "#,
    )
    .bind(pattern)
    .fetch_all(executor)
    .await
}

/// 创建设备
pub async fn insert<'e, E>(executor: E, device: &NewDevice) -> Result<DeviceRecord, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DeviceRecord>(
        r#"
        INSERT INTO devices (
            hardware_address, network_address, primary_info, process_info,
            last_modified_by, note
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&device.hardware_address)
    .bind(&device.network_address)
    .bind(&device.primary_info)
    .bind(&device.process_info)
    .bind(&device.last_modified_by)
    .bind(&device.note)
    .fetch_one(executor)
    .await
}

/// 以快照覆盖设备
pub async fn update<'e, E>(executor: E, device: &DeviceRecord) -> Result<Option<DeviceRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DeviceRecord>(
        r#"
        UPDATE devices
        SET
            hardware_address = $2,
            network_address = $3,
            primary_info = $4,
            process_info = $5,
            last_modified_by = $6,
            note = $7,
            updated_at = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(device.id)
    .bind(&device.hardware_address)
    .bind(&device.network_address)
    .bind(&device.primary_info)
    .bind(&device.process_info)
    .bind(&device.last_modified_by)
    .bind(&device.note)
    .bind(device.updated_at)
    .fetch_optional(executor)
    .await
}

/// 删除设备
pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM devices WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
