//! 设备服务层
//! 提供设备的创建、更新、删除与查询，每次变更与其历史记录在同一事务内提交

use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::InventoryConfig;
use crate::error::{AppError, Result};
use crate::models::device::{CreateDeviceRequest, DeviceField, DevicePatch, DeviceRecord};
use crate::models::history::HistoryEntry;
use crate::repository::InventoryStore;
use crate::services::audit_service::AuditService;
use crate::services::diff::{apply_patch, compute_diff};

/// 设备服务
pub struct DeviceService {
    store: Arc<dyn InventoryStore>,
    audit_service: AuditService,
    default_page_size: i64,
    max_page_size: i64,
}

impl DeviceService {
    /// 创建新的设备服务
    pub fn new(store: Arc<dyn InventoryStore>, config: &InventoryConfig) -> Self {
        Self {
            store,
            audit_service: AuditService::new(),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    pub fn default_page_size(&self) -> i64 {
        self.default_page_size
    }

    /// 注册设备
    #[instrument(skip(self, request))]
    pub async fn create_device(&self, request: CreateDeviceRequest) -> Result<DeviceRecord> {
        let new_device = request.into_new_device()?;

        let mut tx = self.store.begin().await?;

        if tx
            .find_device_by_hardware_address(&new_device.hardware_address)
            .await?
            .is_some()
        {
            return Err(AppError::duplicate_hardware_address(&new_device.hardware_address));
        }

        let device = tx.insert_device(&new_device).await?;
        self.audit_service
            .record_creation(tx.as_mut(), &device)
            .await?;

        tx.commit().await?;

        info!(
            device_id = device.id,
            hardware_address = %device.hardware_address,
            actor = %device.last_modified_by,
            "Device created"
        );

        Ok(device)
    }

    /// 更新设备
    ///
    /// 未出现在补丁中的字段保持不变；只有值真正改变的字段写入历史。
    /// 即使没有任何字段变化，`updated_at` 与操作人也会刷新。
    #[instrument(skip(self, patch))]
    pub async fn update_device(&self, id: i64, patch: DevicePatch) -> Result<DeviceRecord> {
        let patch = patch.normalize()?;
        let actor = patch
            .modifier()
            .ok_or_else(|| AppError::validation("modifier is required"))?
            .to_string();

        let mut tx = self.store.begin().await?;

        let mut device = tx
            .find_device(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("device {}", id)))?;

        if let Some(Some(address)) = patch.value(DeviceField::HardwareAddress) {
            if let Some(other) = tx.find_device_by_hardware_address(address).await? {
                if other.id != id {
                    return Err(AppError::duplicate_hardware_address(address));
                }
            }
        }

        let changes = compute_diff(&device, &patch);
        apply_patch(&mut device, &patch);
        device.updated_at = chrono::Utc::now();

        let device = tx.update_device(&device).await?;
        self.audit_service
            .record_update(tx.as_mut(), id, &actor, &changes)
            .await?;

        tx.commit().await?;

        let changed: Vec<&str> = changes.iter().map(|c| c.field.name()).collect();
        info!(
            device_id = id,
            actor = %actor,
            changes = ?changed,
            "Device updated"
        );

        Ok(device)
    }

    /// 删除设备，历史记录保留
    #[instrument(skip(self))]
    pub async fn delete_device(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let device = tx
            .find_device(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("device {}", id)))?;

        self.audit_service
            .record_deletion(tx.as_mut(), &device)
            .await?;

        if !tx.delete_device(id).await? {
            return Err(AppError::NotFound(format!("device {}", id)));
        }

        tx.commit().await?;

        info!(
            device_id = id,
            hardware_address = %device.hardware_address,
            "Device deleted"
        );

        Ok(())
    }

    /// 获取设备详情
    pub async fn get_device(&self, id: i64) -> Result<DeviceRecord> {
        self.store
            .get_device(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("device {}", id)))
    }

    /// 列出设备
    pub async fn list_devices(&self, offset: i64, limit: i64) -> Result<Vec<DeviceRecord>> {
        self.check_page(offset, limit)?;
        self.store.list_devices(offset, limit).await
    }

    /// 搜索设备
    ///
    /// 按原样匹配查询串（包括首尾空白），只有全空白的查询被拒绝
    pub async fn search_devices(&self, query: &str) -> Result<Vec<DeviceRecord>> {
        if query.trim().is_empty() {
            return Err(AppError::validation("search query must not be empty"));
        }

        self.store.search_devices(query).await
    }

    /// 单个设备的变更历史，设备删除后仍可查询
    pub async fn get_device_history(&self, id: i64) -> Result<Vec<HistoryEntry>> {
        self.store.history_for(id).await
    }

    /// 全部变更历史
    pub async fn get_all_history(&self, offset: i64, limit: i64) -> Result<Vec<HistoryEntry>> {
        self.check_page(offset, limit)?;
        self.store.history_all(offset, limit).await
    }

    fn check_page(&self, offset: i64, limit: i64) -> Result<()> {
        if offset < 0 {
            return Err(AppError::validation("offset must not be negative"));
        }
        if limit < 1 || limit > self.max_page_size {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                self.max_page_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryInventoryStore;

    fn service() -> DeviceService {
        DeviceService::new(
            Arc::new(MemoryInventoryStore::new()),
            &InventoryConfig {
                default_page_size: 100,
                max_page_size: 1000,
            },
        )
    }

    #[tokio::test]
    async fn test_pagination_bounds() {
        let service = service();

        assert!(service.list_devices(0, 1000).await.is_ok());
        assert!(matches!(
            service.list_devices(-1, 10).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.list_devices(0, 0).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.get_all_history(0, 1001).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_search_rejected() {
        assert!(matches!(
            service().search_devices("   ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_device() {
        let service = service();

        assert!(matches!(service.get_device(42).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete_device(42).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.update_device(42, DevicePatch::new("bob")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.get_device_history(42).await.unwrap().is_empty());
    }
}
