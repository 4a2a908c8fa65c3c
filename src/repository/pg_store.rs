//! PostgreSQL 存储实现

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    db::{self, HealthStatus},
    error::AppError,
    models::{
        device::{DeviceRecord, NewDevice},
        history::{HistoryEntry, NewHistoryEntry},
    },
    repository::{
        device_repo, history_repo,
        store::{like_pattern, InventoryStore, StoreTransaction},
    },
};

pub struct PgInventoryStore {
    db: PgPool,
}

impl PgInventoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, AppError> {
        let tx = self.db.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin transaction");
            AppError::Database(e)
        })?;

        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn get_device(&self, id: i64) -> Result<Option<DeviceRecord>, AppError> {
        Ok(device_repo::find_by_id(&self.db, id).await?)
    }

    async fn list_devices(&self, offset: i64, limit: i64) -> Result<Vec<DeviceRecord>, AppError> {
        Ok(device_repo::list(&self.db, offset, limit).await?)
    }

    async fn search_devices(&self, query: &str) -> Result<Vec<DeviceRecord>, AppError> {
        Ok(device_repo::search(&self.db, &like_pattern(query)).await?)
    }

    async fn history_for(&self, device_id: i64) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(history_repo::for_device(&self.db, device_id).await?)
    }

    async fn history_all(&self, offset: i64, limit: i64) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(history_repo::list(&self.db, offset, limit).await?)
    }

    async fn health_check(&self) -> HealthStatus {
        db::record_pool_metrics(&self.db);
        db::health_check(&self.db).await
    }

    async fn close(&self) {
        self.db.close().await;
        tracing::info!("Database pool closed");
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// 事务未提交即被丢弃时，sqlx 自动回滚
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn find_device(&mut self, id: i64) -> Result<Option<DeviceRecord>, AppError> {
        Ok(device_repo::find_by_id_for_update(&mut *self.tx, id).await?)
    }

    async fn find_device_by_hardware_address(
        &mut self,
        hardware_address: &str,
    ) -> Result<Option<DeviceRecord>, AppError> {
        Ok(device_repo::find_by_hardware_address(&mut *self.tx, hardware_address).await?)
    }

    async fn insert_device(&mut self, device: &NewDevice) -> Result<DeviceRecord, AppError> {
        device_repo::insert(&mut *self.tx, device)
            .await
            .map_err(|e| AppError::from_write(e, &device.hardware_address))
    }

    async fn update_device(&mut self, device: &DeviceRecord) -> Result<DeviceRecord, AppError> {
        device_repo::update(&mut *self.tx, device)
            .await
            .map_err(|e| AppError::from_write(e, &device.hardware_address))?
            .ok_or_else(|| AppError::NotFound(format!("device {}", device.id)))
    }

    async fn delete_device(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(device_repo::delete(&mut *self.tx, id).await?)
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<HistoryEntry, AppError> {
        history_repo::append(&mut *self.tx, entry).await.map_err(|e| {
            tracing::error!(error = %e, device_id = entry.device_id, "Failed to append history");
            AppError::Database(e)
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        this.tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit transaction");
            AppError::Database(e)
        })
    }
}
