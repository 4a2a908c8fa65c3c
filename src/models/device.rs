//! Edge device domain models

use crate::{
    error::AppError,
    models::address::{normalize_hardware_address, normalize_network_address},
};
use chrono::{DateTime, Utc};
use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};
use std::fmt;
use validator::Validate;

/// 边缘设备记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceRecord {
    pub id: i64,
    pub hardware_address: String,
    pub network_address: Option<String>,
    pub primary_info: String,
    pub process_info: String,
    pub last_modified_by: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create device request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeviceRequest {
    #[validate(length(min = 1, max = 17))]
    pub hardware_address: String,
    #[validate(length(max = 15))]
    pub network_address: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub primary_info: String,
    #[validate(length(min = 1, max = 255))]
    pub process_info: String,
    #[validate(length(min = 1, max = 100))]
    pub modifier: String,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

impl CreateDeviceRequest {
    /// 校验并规范化为待插入记录
    pub fn into_new_device(mut self) -> Result<NewDevice, AppError> {
        // 地址字段先去掉首尾空白再做长度校验
        self.hardware_address = self.hardware_address.trim().to_string();
        self.network_address = self.network_address.map(|v| v.trim().to_string());
        self.validate()?;

        for (field, value) in [
            (DeviceField::PrimaryInfo, &self.primary_info),
            (DeviceField::ProcessInfo, &self.process_info),
            (DeviceField::LastModifiedBy, &self.modifier),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{} must not be blank", field.name())));
            }
        }

        let network_address = match non_empty(self.network_address) {
            Some(address) => Some(normalize_network_address(&address)?),
            None => None,
        };

        Ok(NewDevice {
            hardware_address: normalize_hardware_address(&self.hardware_address)?,
            network_address,
            primary_info: self.primary_info,
            process_info: self.process_info,
            last_modified_by: self.modifier,
            note: non_empty(self.note),
        })
    }
}

/// 已校验、已规范化的新设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub hardware_address: String,
    pub network_address: Option<String>,
    pub primary_info: String,
    pub process_info: String,
    pub last_modified_by: String,
    pub note: Option<String>,
}

/// 设备字段描述表
///
/// 每个字段对应一对访问器/修改器，差异计算只遍历这张表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceField {
    HardwareAddress,
    NetworkAddress,
    PrimaryInfo,
    ProcessInfo,
    LastModifiedBy,
    Note,
}

impl DeviceField {
    pub const ALL: [DeviceField; 6] = [
        DeviceField::HardwareAddress,
        DeviceField::NetworkAddress,
        DeviceField::PrimaryInfo,
        DeviceField::ProcessInfo,
        DeviceField::LastModifiedBy,
        DeviceField::Note,
    ];

    const NAMES: &'static [&'static str] = &[
        "hardware_address",
        "network_address",
        "primary_info",
        "process_info",
        "modifier",
        "note",
    ];

    /// 请求与历史记录中使用的字段名
    pub fn name(self) -> &'static str {
        match self {
            DeviceField::HardwareAddress => "hardware_address",
            DeviceField::NetworkAddress => "network_address",
            DeviceField::PrimaryInfo => "primary_info",
            DeviceField::ProcessInfo => "process_info",
            DeviceField::LastModifiedBy => "modifier",
            DeviceField::Note => "note",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// 归属字段不参与差异计算，只作为操作人
    pub fn is_attribution(self) -> bool {
        matches!(self, DeviceField::LastModifiedBy)
    }

    pub fn is_nullable(self) -> bool {
        matches!(self, DeviceField::NetworkAddress | DeviceField::Note)
    }

    pub fn max_len(self) -> usize {
        match self {
            DeviceField::HardwareAddress => 17,
            DeviceField::NetworkAddress => 15,
            DeviceField::PrimaryInfo | DeviceField::ProcessInfo => 255,
            DeviceField::LastModifiedBy => 100,
            DeviceField::Note => 500,
        }
    }

    /// 读取字段值，空值统一为 None
    pub fn get(self, record: &DeviceRecord) -> Option<&str> {
        let value = match self {
            DeviceField::HardwareAddress => Some(record.hardware_address.as_str()),
            DeviceField::NetworkAddress => record.network_address.as_deref(),
            DeviceField::PrimaryInfo => Some(record.primary_info.as_str()),
            DeviceField::ProcessInfo => Some(record.process_info.as_str()),
            DeviceField::LastModifiedBy => Some(record.last_modified_by.as_str()),
            DeviceField::Note => record.note.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// 写入字段值
    pub fn set(self, record: &mut DeviceRecord, value: Option<String>) {
        let value = non_empty(value);
        match self {
            DeviceField::HardwareAddress => record.hardware_address = value.unwrap_or_default(),
            DeviceField::NetworkAddress => record.network_address = value,
            DeviceField::PrimaryInfo => record.primary_info = value.unwrap_or_default(),
            DeviceField::ProcessInfo => record.process_info = value.unwrap_or_default(),
            DeviceField::LastModifiedBy => record.last_modified_by = value.unwrap_or_default(),
            DeviceField::Note => record.note = value,
        }
    }

    /// 校验并规范化单个字段的新值
    fn normalize(self, value: Option<String>) -> Result<Option<String>, AppError> {
        let value = match self {
            DeviceField::HardwareAddress | DeviceField::NetworkAddress => {
                value.map(|v| v.trim().to_string())
            }
            _ => value,
        };
        let Some(value) = non_empty(value) else {
            if self.is_nullable() {
                return Ok(None);
            }
            return Err(AppError::Validation(format!("{} is required", self.name())));
        };

        if value.chars().count() > self.max_len() {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                self.name(),
                self.max_len()
            )));
        }

        match self {
            DeviceField::HardwareAddress => normalize_hardware_address(&value).map(Some),
            DeviceField::NetworkAddress => normalize_network_address(&value).map(Some),
            _ if value.trim().is_empty() => {
                Err(AppError::Validation(format!("{} must not be blank", self.name())))
            }
            _ => Ok(Some(value)),
        }
    }
}

impl fmt::Display for DeviceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 设备的部分更新
///
/// 只包含调用方打算修改的字段，保留请求中的字段顺序。
/// `null` 或空串表示清空可空字段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePatch {
    entries: Vec<(DeviceField, Option<String>)>,
}

impl DevicePatch {
    /// 以操作人开始构造补丁
    pub fn new(modifier: impl Into<String>) -> Self {
        Self {
            entries: vec![(DeviceField::LastModifiedBy, Some(modifier.into()))],
        }
    }

    /// 设置字段新值；重复设置同一字段时覆盖原值
    pub fn set(mut self, field: DeviceField, value: impl Into<String>) -> Self {
        self.put(field, Some(value.into()));
        self
    }

    /// 清空可空字段
    pub fn clear(mut self, field: DeviceField) -> Self {
        self.put(field, None);
        self
    }

    fn put(&mut self, field: DeviceField, value: Option<String>) {
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn entries(&self) -> &[(DeviceField, Option<String>)] {
        &self.entries
    }

    /// 字段是否出现在补丁中，以及它的新值
    pub fn value(&self, field: DeviceField) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value.as_deref())
    }

    /// 操作人
    pub fn modifier(&self) -> Option<&str> {
        self.value(DeviceField::LastModifiedBy).flatten()
    }

    /// 校验所有字段并返回规范化后的补丁
    pub fn normalize(self) -> Result<DevicePatch, AppError> {
        if self.modifier().map_or(true, |m| m.trim().is_empty()) {
            return Err(AppError::validation("modifier is required"));
        }

        let entries = self
            .entries
            .into_iter()
            .map(|(field, value)| field.normalize(value).map(|value| (field, value)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DevicePatch { entries })
    }
}

impl<'de> Deserialize<'de> for DevicePatch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PatchVisitor;

        impl<'de> Visitor<'de> for PatchVisitor {
            type Value = DevicePatch;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a device update object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<DevicePatch, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(DeviceField, Option<String>)> = Vec::new();

                while let Some(key) = map.next_key::<String>()? {
                    let field = DeviceField::from_name(&key)
                        .ok_or_else(|| de::Error::unknown_field(&key, DeviceField::NAMES))?;
                    if entries.iter().any(|(f, _)| *f == field) {
                        return Err(de::Error::duplicate_field(field.name()));
                    }
                    let value: Option<String> = map.next_value()?;
                    entries.push((field, value));
                }

                Ok(DevicePatch { entries })
            }
        }

        deserializer.deserialize_map(PatchVisitor)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
