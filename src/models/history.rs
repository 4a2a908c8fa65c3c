//! Device history domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 历史记录的操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Create => "CREATE",
            HistoryAction::Update => "UPDATE",
            HistoryAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown history action: {0}")]
pub struct UnknownHistoryAction(pub String);

impl TryFrom<String> for HistoryAction {
    type Error = UnknownHistoryAction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "CREATE" => Ok(HistoryAction::Create),
            "UPDATE" => Ok(HistoryAction::Update),
            "DELETE" => Ok(HistoryAction::Delete),
            _ => Err(UnknownHistoryAction(value)),
        }
    }
}

/// 变更历史条目，只追加，不修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    /// 软引用，设备删除后仍保留
    pub device_id: i64,
    #[sqlx(try_from = "String")]
    pub action: HistoryAction,
    /// 仅 UPDATE 条目有值
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: String,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
}

/// 待追加的历史条目，id 与时间由存储分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub device_id: i64,
    pub action: HistoryAction,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: String,
    pub description: String,
}
