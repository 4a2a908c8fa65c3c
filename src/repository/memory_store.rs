//! 进程内存储实现
//!
//! 用于本地开发与测试（`database.url = "memory://"`）。事务持有整张表的锁，
//! 只暂存本事务写入的设备与新增的历史，提交时合并，丢弃即回滚。
//! 历史按追加顺序保存，`occurred_at` 与 id 同时递增，倒序遍历即为最新在前。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    db::HealthStatus,
    error::AppError,
    models::{
        device::{DeviceRecord, NewDevice},
        history::{HistoryEntry, NewHistoryEntry},
    },
    repository::store::{InventoryStore, StoreTransaction},
};

#[derive(Debug, Default)]
struct Tables {
    devices: BTreeMap<i64, DeviceRecord>,
    history: Vec<HistoryEntry>,
    last_device_id: i64,
    last_history_id: i64,
}

#[derive(Default)]
pub struct MemoryInventoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, AppError> {
        let guard = self.tables.clone().lock_owned().await;
        let last_device_id = guard.last_device_id;
        let last_history_id = guard.last_history_id;
        Ok(Box::new(MemoryTransaction {
            guard,
            devices: BTreeMap::new(),
            history: Vec::new(),
            last_device_id,
            last_history_id,
        }))
    }

    async fn get_device(&self, id: i64) -> Result<Option<DeviceRecord>, AppError> {
        Ok(self.tables.lock().await.devices.get(&id).cloned())
    }

    async fn list_devices(&self, offset: i64, limit: i64) -> Result<Vec<DeviceRecord>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .devices
            .values()
            .skip(to_usize(offset))
            .take(to_usize(limit))
            .cloned()
            .collect())
    }

    async fn search_devices(&self, query: &str) -> Result<Vec<DeviceRecord>, AppError> {
        let needle = query.to_lowercase();
        let hit = |value: Option<&str>| value.is_some_and(|v| v.to_lowercase().contains(&needle));

        let tables = self.tables.lock().await;
        Ok(tables
            .devices
            .values()
            .filter(|d| {
                hit(Some(d.hardware_address.as_str()))
                    || hit(d.network_address.as_deref())
                    || hit(Some(d.primary_info.as_str()))
                    || hit(Some(d.process_info.as_str()))
                    || hit(Some(d.last_modified_by.as_str()))
                    || hit(d.note.as_deref())
            })
            .cloned()
            .collect())
    }

    async fn history_for(&self, device_id: i64) -> Result<Vec<HistoryEntry>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .history
            .iter()
            .rev()
            .filter(|h| h.device_id == device_id)
            .cloned()
            .collect())
    }

    async fn history_all(&self, offset: i64, limit: i64) -> Result<Vec<HistoryEntry>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .history
            .iter()
            .rev()
            .skip(to_usize(offset))
            .take(to_usize(limit))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    async fn close(&self) {
        tracing::debug!("Memory store closed");
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// 内存事务
///
/// `devices` 记录本事务写过的设备，`None` 表示已删除。
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    devices: BTreeMap<i64, Option<DeviceRecord>>,
    history: Vec<HistoryEntry>,
    last_device_id: i64,
    last_history_id: i64,
}

impl MemoryTransaction {
    /// 事务视角下的设备
    fn device(&self, id: i64) -> Option<&DeviceRecord> {
        match self.devices.get(&id) {
            Some(staged) => staged.as_ref(),
            None => self.guard.devices.get(&id),
        }
    }

    /// 事务视角下的全部设备
    fn visible_devices(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.guard
            .devices
            .iter()
            .filter(move |(id, _)| !self.devices.contains_key(*id))
            .map(|(_, device)| device)
            .chain(self.devices.values().flatten())
    }

    fn hardware_address_taken(&self, hardware_address: &str, except_id: Option<i64>) -> bool {
        self.visible_devices()
            .any(|d| d.hardware_address == hardware_address && Some(d.id) != except_id)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_device(&mut self, id: i64) -> Result<Option<DeviceRecord>, AppError> {
        Ok(self.device(id).cloned())
    }

    async fn find_device_by_hardware_address(
        &mut self,
        hardware_address: &str,
    ) -> Result<Option<DeviceRecord>, AppError> {
        Ok(self
            .visible_devices()
            .find(|d| d.hardware_address == hardware_address)
            .cloned())
    }

    async fn insert_device(&mut self, device: &NewDevice) -> Result<DeviceRecord, AppError> {
        if self.hardware_address_taken(&device.hardware_address, None) {
            return Err(AppError::duplicate_hardware_address(&device.hardware_address));
        }

        self.last_device_id += 1;
        let now = Utc::now();
        let record = DeviceRecord {
            id: self.last_device_id,
            hardware_address: device.hardware_address.clone(),
            network_address: device.network_address.clone(),
            primary_info: device.primary_info.clone(),
            process_info: device.process_info.clone(),
            last_modified_by: device.last_modified_by.clone(),
            note: device.note.clone(),
            created_at: now,
            updated_at: now,
        };
        self.devices.insert(record.id, Some(record.clone()));

        Ok(record)
    }

    async fn update_device(&mut self, device: &DeviceRecord) -> Result<DeviceRecord, AppError> {
        if self.hardware_address_taken(&device.hardware_address, Some(device.id)) {
            return Err(AppError::duplicate_hardware_address(&device.hardware_address));
        }
        if self.device(device.id).is_none() {
            return Err(AppError::NotFound(format!("device {}", device.id)));
        }

        self.devices.insert(device.id, Some(device.clone()));

        Ok(device.clone())
    }

    async fn delete_device(&mut self, id: i64) -> Result<bool, AppError> {
        if self.device(id).is_none() {
            return Ok(false);
        }

        self.devices.insert(id, None);
        Ok(true)
    }

    async fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<HistoryEntry, AppError> {
        let now = Utc::now();
        let occurred_at = self
            .history
            .last()
            .or_else(|| self.guard.history.last())
            .map_or(now, |last| last.occurred_at.max(now));

        self.last_history_id += 1;
        let stored = HistoryEntry {
            id: self.last_history_id,
            device_id: entry.device_id,
            action: entry.action,
            field_name: entry.field_name.clone(),
            old_value: entry.old_value.clone(),
            new_value: entry.new_value.clone(),
            actor: entry.actor.clone(),
            occurred_at,
            description: entry.description.clone(),
        };
        self.history.push(stored.clone());

        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction {
            mut guard,
            devices,
            history,
            last_device_id,
            last_history_id,
        } = *self;

        for (id, device) in devices {
            match device {
                Some(device) => guard.devices.insert(id, device),
                None => guard.devices.remove(&id),
            };
        }
        guard.history.extend(history);
        guard.last_device_id = last_device_id;
        guard.last_history_id = last_history_id;

        Ok(())
    }
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::HistoryAction;

    fn new_device(hardware_address: &str) -> NewDevice {
        NewDevice {
            hardware_address: hardware_address.to_string(),
            network_address: None,
            primary_info: "sensor-01".to_string(),
            process_info: "collect".to_string(),
            last_modified_by: "alice".to_string(),
            note: None,
        }
    }

    fn history(device_id: i64) -> NewHistoryEntry {
        NewHistoryEntry {
            device_id,
            action: HistoryAction::Create,
            field_name: None,
            old_value: None,
            new_value: None,
            actor: "alice".to_string(),
            description: "created".to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = MemoryInventoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let device = tx.insert_device(&new_device("AA:BB:CC:DD:EE:FF")).await.unwrap();
        tx.append_history(&history(device.id)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.get_device(device.id).await.unwrap(), Some(device.clone()));
        assert_eq!(store.history_for(device.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = MemoryInventoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            let device = tx.insert_device(&new_device("AA:BB:CC:DD:EE:FF")).await.unwrap();
            tx.append_history(&history(device.id)).await.unwrap();
        }

        assert!(store.list_devices(0, 10).await.unwrap().is_empty());
        assert!(store.history_all(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_hardware_address_conflicts() {
        let store = MemoryInventoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_device(&new_device("AA:BB:CC:DD:EE:FF")).await.unwrap();
        let result = tx.insert_device(&new_device("AA:BB:CC:DD:EE:FF")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_transaction_sees_own_writes_only_after_commit() {
        let store = MemoryInventoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let first = tx.insert_device(&new_device("AA:BB:CC:DD:EE:01")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.delete_device(first.id).await.unwrap());
        assert_eq!(tx.find_device(first.id).await.unwrap(), None);
        // 删除后同一地址可在本事务内重新使用
        let second = tx.insert_device(&new_device("AA:BB:CC:DD:EE:01")).await.unwrap();
        assert_eq!(second.id, first.id + 1);
        drop(tx);

        assert_eq!(store.get_device(first.id).await.unwrap(), Some(first.clone()));
        assert_eq!(store.get_device(second.id).await.unwrap(), None);

        // 回滚的事务不推进 id
        let mut tx = store.begin().await.unwrap();
        let third = tx.insert_device(&new_device("AA:BB:CC:DD:EE:02")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(third.id, second.id);
    }

    #[tokio::test]
    async fn test_history_timestamps_non_decreasing() {
        let store = MemoryInventoryStore::new();

        let mut tx = store.begin().await.unwrap();
        for device_id in 1..=5 {
            tx.append_history(&history(device_id)).await.unwrap();
        }
        tx.commit().await.unwrap();

        let entries = store.history_all(0, 10).await.unwrap();
        assert_eq!(entries.len(), 5);
        for pair in entries.windows(2) {
            assert!(pair[0].occurred_at >= pair[1].occurred_at);
            assert!(pair[0].id > pair[1].id);
        }
    }
}
