//! 存储抽象
//!
//! 设备表与历史表作为一个整体对外提供：
//! - `InventoryStore`: 读路径与事务入口，进程启动时创建、关闭时释放
//! - `StoreTransaction`: 一次变更的工作单元，设备写入与历史追加要么一起提交，
//!   要么一起丢弃（未提交即丢弃视为回滚）

use async_trait::async_trait;

use crate::{
    db::HealthStatus,
    error::AppError,
    models::{
        device::{DeviceRecord, NewDevice},
        history::{HistoryEntry, NewHistoryEntry},
    },
};

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// 开启一个事务
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, AppError>;

    /// 按 id 查询设备
    async fn get_device(&self, id: i64) -> Result<Option<DeviceRecord>, AppError>;

    /// 按 id 升序分页列出设备
    async fn list_devices(&self, offset: i64, limit: i64) -> Result<Vec<DeviceRecord>, AppError>;

    /// 在所有文本字段中做不区分大小写的子串匹配
    async fn search_devices(&self, query: &str) -> Result<Vec<DeviceRecord>, AppError>;

    /// 单个设备的历史，按发生时间倒序
    async fn history_for(&self, device_id: i64) -> Result<Vec<HistoryEntry>, AppError>;

    /// 全部历史，按发生时间倒序分页
    async fn history_all(&self, offset: i64, limit: i64) -> Result<Vec<HistoryEntry>, AppError>;

    async fn health_check(&self) -> HealthStatus;

    /// 释放底层资源
    async fn close(&self);

    /// 后端名称，用于日志
    fn backend(&self) -> &'static str;
}

#[async_trait]
pub trait StoreTransaction: Send {
    /// 读取设备并锁定该行直到事务结束
    async fn find_device(&mut self, id: i64) -> Result<Option<DeviceRecord>, AppError>;

    async fn find_device_by_hardware_address(
        &mut self,
        hardware_address: &str,
    ) -> Result<Option<DeviceRecord>, AppError>;

    /// 插入设备；硬件地址冲突返回 `AppError::Conflict`
    async fn insert_device(&mut self, device: &NewDevice) -> Result<DeviceRecord, AppError>;

    /// 以完整快照覆盖设备（包括 updated_at）
    async fn update_device(&mut self, device: &DeviceRecord) -> Result<DeviceRecord, AppError>;

    async fn delete_device(&mut self, id: i64) -> Result<bool, AppError>;

    /// 追加历史条目，occurred_at 不早于已有条目
    async fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<HistoryEntry, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

/// 转义 LIKE 模式中的通配符
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
