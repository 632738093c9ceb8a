// ==========================================
// 药盒转运分配引擎 - 设备与抽屉领域模型
// ==========================================
// 设备/抽屉为长期存在的外部数据，引擎不创建
// ==========================================

use crate::domain::types::{DeviceKind, DrawerType};
use serde::{Deserialize, Serialize};

// ==========================================
// DeviceRecord - 设备
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device_id: i64,
    pub kind: DeviceKind,
    pub max_canisters: i64,
    pub disabled_locations: i64, // 已禁用库位数
}

// ==========================================
// DrawerInventory - 抽屉库存
// ==========================================
// 红线: 已占用槽位数 <= capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerInventory {
    pub device_id: i64,
    pub drawer_id: i64,
    pub level: i32, // 1 或 2
    pub drawer_type: DrawerType,
    pub capacity: usize,
    pub free_slot_ids: Vec<i64>,
}

impl DrawerInventory {
    /// 可用槽位数（不超过抽屉容量）
    pub fn free_slot_count(&self) -> usize {
        self.free_slot_ids.len().min(self.capacity)
    }

    /// 抽屉是否还有可用槽位
    pub fn has_free_slot(&self) -> bool {
        self.free_slot_count() > 0
    }
}

// ==========================================
// DeviceCapacity - 机器人/CSR 容量汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapacity {
    pub device_id: i64,
    pub kind: DeviceKind,
    pub max_canisters: i64,
    pub occupied: i64,
    pub disabled_locations: i64,
    pub reserved_manual_fill: i64,
    pub empty_locations: i64,
}

impl DeviceCapacity {
    /// 计算空库位数: max - 占用 - 禁用 - 人工补药预留，下限 0
    pub fn compute(device: &DeviceRecord, occupied: i64, reserved_manual_fill: i64) -> Self {
        let empty_locations = (device.max_canisters
            - occupied
            - device.disabled_locations.max(0)
            - reserved_manual_fill.max(0))
        .max(0);
        Self {
            device_id: device.device_id,
            kind: device.kind,
            max_canisters: device.max_canisters,
            occupied,
            disabled_locations: device.disabled_locations,
            reserved_manual_fill,
            empty_locations,
        }
    }
}
