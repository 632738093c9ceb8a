// ==========================================
// 药盒转运分配引擎 - 位置快照
// ==========================================
// 职责: 药盒当前位置 + 各设备抽屉库存的只读视图
// 红线: 一次分配运行只基于一个不可变快照
// ==========================================

use crate::domain::canister::CanisterSnapshot;
use crate::domain::device::{DeviceCapacity, DeviceRecord, DrawerInventory};
use crate::domain::types::{DeviceKind, TrolleyKind};
use std::collections::HashMap;

// ==========================================
// LocationSnapshot - 位置快照
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct LocationSnapshot {
    canisters: HashMap<i64, CanisterSnapshot>,
    devices: HashMap<i64, DeviceRecord>,
    drawers: HashMap<i64, Vec<DrawerInventory>>, // device_id → 抽屉(按层/抽屉ID排序)
    occupancy: HashMap<i64, usize>,              // device_id → 药盒数
}

impl LocationSnapshot {
    /// 构建快照索引
    ///
    /// # 参数
    /// - canisters: 药盒位置列表
    /// - devices: 设备列表
    /// - drawers: 抽屉库存列表（引用未知设备的抽屉保留，但设备类型未知）
    pub fn new(
        canisters: Vec<CanisterSnapshot>,
        devices: Vec<DeviceRecord>,
        drawers: Vec<DrawerInventory>,
    ) -> Self {
        let mut occupancy: HashMap<i64, usize> = HashMap::new();
        for canister in &canisters {
            if let Some(device_id) = canister.device_id {
                *occupancy.entry(device_id).or_insert(0) += 1;
            }
        }

        let mut drawer_map: HashMap<i64, Vec<DrawerInventory>> = HashMap::new();
        for drawer in drawers {
            drawer_map.entry(drawer.device_id).or_default().push(drawer);
        }
        for list in drawer_map.values_mut() {
            list.sort_by_key(|d| (d.level, d.drawer_id));
        }

        Self {
            canisters: canisters.into_iter().map(|c| (c.canister_id, c)).collect(),
            devices: devices.into_iter().map(|d| (d.device_id, d)).collect(),
            drawers: drawer_map,
            occupancy,
        }
    }

    pub fn placement(&self, canister_id: i64) -> Option<&CanisterSnapshot> {
        self.canisters.get(&canister_id)
    }

    pub fn device_kind(&self, device_id: i64) -> Option<DeviceKind> {
        self.devices.get(&device_id).map(|d| d.kind)
    }

    /// 设备抽屉库存（无库存设备返回空切片 ⇒ 容量为 0）
    pub fn drawers_of(&self, device_id: i64) -> &[DrawerInventory] {
        self.drawers
            .get(&device_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 设备内当前药盒数
    pub fn canisters_at(&self, device_id: i64) -> usize {
        self.occupancy.get(&device_id).copied().unwrap_or(0)
    }

    /// 所有小车抽屉，按 (设备ID, 层, 抽屉ID) 排序
    pub fn trolley_drawers(&self) -> Vec<(TrolleyKind, &DrawerInventory)> {
        let mut device_ids: Vec<i64> = self
            .devices
            .values()
            .filter(|d| d.kind.is_trolley())
            .map(|d| d.device_id)
            .collect();
        device_ids.sort_unstable();

        let mut result = Vec::new();
        for device_id in device_ids {
            let kind = match self.device_kind(device_id).and_then(|k| k.trolley_kind()) {
                Some(kind) => kind,
                None => continue,
            };
            for drawer in self.drawers_of(device_id) {
                result.push((kind, drawer));
            }
        }
        result
    }

    /// 单台机器人/CSR 的容量（其他设备返回 None）
    pub fn device_capacity(&self, device_id: i64, reserved_manual_fill: i64) -> Option<DeviceCapacity> {
        self.devices
            .get(&device_id)
            .filter(|d| matches!(d.kind, DeviceKind::Robot | DeviceKind::Csr))
            .map(|d| DeviceCapacity::compute(d, self.canisters_at(device_id) as i64, reserved_manual_fill))
    }

    /// 机器人/CSR 容量汇总，按设备ID排序
    ///
    /// # 参数
    /// - reserved_manual_fill: 每台设备预留的人工补药库位数
    pub fn storage_capacities(&self, reserved_manual_fill: i64) -> Vec<DeviceCapacity> {
        let mut result: Vec<DeviceCapacity> = self
            .devices
            .keys()
            .filter_map(|&device_id| self.device_capacity(device_id, reserved_manual_fill))
            .collect();
        result.sort_by_key(|c| c.device_id);
        result
    }
}
