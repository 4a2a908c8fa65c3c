//! 字段级差异计算

use crate::models::device::{DevicePatch, DeviceField, DeviceRecord};

/// 单个字段的变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: DeviceField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// 计算补丁相对当前记录的变更
///
/// 补丁需已规范化。按补丁中的字段顺序输出，跳过归属字段；
/// 新旧值的字符串形式相同则不产生变更，空值视为 None。
pub fn compute_diff(current: &DeviceRecord, patch: &DevicePatch) -> Vec<FieldChange> {
    patch
        .entries()
        .iter()
        .filter(|(field, _)| !field.is_attribution())
        .filter_map(|(field, proposed)| {
            let old_value = field.get(current);
            let new_value = proposed.as_deref().filter(|v| !v.is_empty());

            (old_value != new_value).then(|| FieldChange {
                field: *field,
                old_value: old_value.map(str::to_string),
                new_value: new_value.map(str::to_string),
            })
        })
        .collect()
}

/// 把补丁中的所有字段（包括归属字段）写入记录
pub fn apply_patch(record: &mut DeviceRecord, patch: &DevicePatch) {
    for (field, value) in patch.entries() {
        field.set(record, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn device() -> DeviceRecord {
        let now = Utc::now();
        DeviceRecord {
            id: 1,
            hardware_address: "AA:BB:CC:DD:EE:FF".to_string(),
            network_address: None,
            primary_info: "sensor-01".to_string(),
            process_info: "collect".to_string(),
            last_modified_by: "alice".to_string(),
            note: Some("rack 1".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_single_field_change() {
        let patch = DevicePatch::new("bob").set(DeviceField::ProcessInfo, "relay");

        let changes = compute_diff(&device(), &patch);
        assert_eq!(
            changes,
            vec![FieldChange {
                field: DeviceField::ProcessInfo,
                old_value: Some("collect".to_string()),
                new_value: Some("relay".to_string()),
            }]
        );
    }

    #[test]
    fn test_unchanged_values_produce_nothing() {
        let patch = DevicePatch::new("bob")
            .set(DeviceField::ProcessInfo, "collect")
            .set(DeviceField::HardwareAddress, "AA:BB:CC:DD:EE:FF")
            .clear(DeviceField::NetworkAddress);

        assert!(compute_diff(&device(), &patch).is_empty());
    }

    #[test]
    fn test_modifier_never_diffed() {
        let patch = DevicePatch::new("carol");
        assert!(compute_diff(&device(), &patch).is_empty());
    }

    #[test]
    fn test_empty_string_treated_as_absent() {
        let patch = DevicePatch::new("bob").set(DeviceField::NetworkAddress, "");
        assert!(compute_diff(&device(), &patch).is_empty());

        let patch = DevicePatch::new("bob").set(DeviceField::Note, "");
        let changes = compute_diff(&device(), &patch);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value.as_deref(), Some("rack 1"));
        assert_eq!(changes[0].new_value, None);
    }

    #[test]
    fn test_changes_follow_patch_order() {
        let patch = DevicePatch::new("bob")
            .set(DeviceField::Note, "rack 2")
            .set(DeviceField::NetworkAddress, "10.0.0.5")
            .set(DeviceField::PrimaryInfo, "sensor-02");

        let fields: Vec<_> = compute_diff(&device(), &patch)
            .into_iter()
            .map(|c| c.field)
            .collect();
        assert_eq!(
            fields,
            vec![DeviceField::Note, DeviceField::NetworkAddress, DeviceField::PrimaryInfo]
        );
    }

    #[test]
    fn test_apply_patch_sets_modifier_and_fields() {
        let mut record = device();
        let patch = DevicePatch::new("bob")
            .set(DeviceField::ProcessInfo, "relay")
            .clear(DeviceField::Note);

        apply_patch(&mut record, &patch);

        assert_eq!(record.process_info, "relay");
        assert_eq!(record.last_modified_by, "bob");
        assert_eq!(record.note, None);
        assert_eq!(record.primary_info, "sensor-01");
    }
}
