//! 变更历史记录服务
//!
//! 把一次生命周期事件及其字段变更转换为历史条目，在调用方的事务内追加。

use crate::{
    error::AppError,
    models::{
        device::DeviceRecord,
        history::{HistoryAction, HistoryEntry, NewHistoryEntry},
    },
    repository::StoreTransaction,
    services::diff::FieldChange,
};

/// 删除操作固定记录的操作人
pub const SYSTEM_ACTOR: &str = "System";

/// 历史记录参数结构体
#[derive(Debug, Clone)]
pub struct AuditParams<'a> {
    pub device_id: i64,
    pub action: HistoryAction,
    pub actor: &'a str,
    pub changes: &'a [FieldChange],
    pub description: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct AuditService;

impl AuditService {
    pub fn new() -> Self {
        Self
    }

    /// 记录历史条目
    ///
    /// - CREATE / DELETE: 一条不带字段名的条目，DELETE 的操作人固定为 `System`
    /// - UPDATE: 每个变更字段一条，无变更则不写入
    pub async fn record(
        &self,
        tx: &mut dyn StoreTransaction,
        params: AuditParams<'_>,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        let entries: Vec<NewHistoryEntry> = match params.action {
            HistoryAction::Create => vec![NewHistoryEntry {
                device_id: params.device_id,
                action: HistoryAction::Create,
                field_name: None,
                old_value: None,
                new_value: None,
                actor: params.actor.to_string(),
                description: params.description.to_string(),
            }],
            HistoryAction::Update => params
                .changes
                .iter()
                .map(|change| NewHistoryEntry {
                    device_id: params.device_id,
                    action: HistoryAction::Update,
                    field_name: Some(change.field.name().to_string()),
                    old_value: change.old_value.clone(),
                    new_value: change.new_value.clone(),
                    actor: params.actor.to_string(),
                    description: if params.description.is_empty() {
                        format!("{} changed", change.field)
                    } else {
                        params.description.to_string()
                    },
                })
                .collect(),
            HistoryAction::Delete => vec![NewHistoryEntry {
                device_id: params.device_id,
                action: HistoryAction::Delete,
                field_name: None,
                old_value: None,
                new_value: None,
                actor: SYSTEM_ACTOR.to_string(),
                description: params.description.to_string(),
            }],
        };

        let mut recorded = Vec::with_capacity(entries.len());
        for entry in &entries {
            recorded.push(tx.append_history(entry).await?);
        }

        if !recorded.is_empty() {
            metrics::counter!("history_entries_appended_total", "action" => params.action.as_str())
                .increment(recorded.len() as u64);
        }

        tracing::debug!(
            device_id = params.device_id,
            action = %params.action,
            entries = recorded.len(),
            "History recorded"
        );

        Ok(recorded)
    }

    /// 记录设备创建
    pub async fn record_creation(
        &self,
        tx: &mut dyn StoreTransaction,
        device: &DeviceRecord,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        let description = format!(
            "Device registered: hardware_address={}, primary_info={}",
            device.hardware_address, device.primary_info
        );

        self.record(
            tx,
            AuditParams {
                device_id: device.id,
                action: HistoryAction::Create,
                actor: &device.last_modified_by,
                changes: &[],
                description: &description,
            },
        )
        .await
    }

    /// 记录设备更新，每个字段一条
    pub async fn record_update(
        &self,
        tx: &mut dyn StoreTransaction,
        device_id: i64,
        actor: &str,
        changes: &[FieldChange],
    ) -> Result<Vec<HistoryEntry>, AppError> {
        self.record(
            tx,
            AuditParams {
                device_id,
                action: HistoryAction::Update,
                actor,
                changes,
                description: "",
            },
        )
        .await
    }

    /// 记录设备删除
    pub async fn record_deletion(
        &self,
        tx: &mut dyn StoreTransaction,
        device: &DeviceRecord,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        let description = format!(
            "Device deleted: hardware_address={}, primary_info={}",
            device.hardware_address, device.primary_info
        );

        self.record(
            tx,
            AuditParams {
                device_id: device.id,
                action: HistoryAction::Delete,
                actor: SYSTEM_ACTOR,
                changes: &[],
                description: &description,
            },
        )
        .await
    }
}
