// ==========================================
// 测试数据构建器
// ==========================================
// 职责: 提供便捷的测试数据构建方法
// ==========================================

use canister_transfer::domain::types::{DeviceKind, DrawerType, TransferStatus};
use canister_transfer::domain::{
    CanisterSnapshot, DemandLine, DeviceRecord, DrawerInventory, TransferCandidate,
};

// ==========================================
// 设备与抽屉
// ==========================================

pub fn device(device_id: i64, kind: DeviceKind) -> DeviceRecord {
    DeviceRecord {
        device_id,
        kind,
        max_canisters: 100,
        disabled_locations: 0,
    }
}

/// 小车抽屉，空闲库位 ID 从 first_slot 开始连续编号
pub fn trolley_drawer(
    device_id: i64,
    drawer_id: i64,
    capacity: usize,
    free: usize,
    first_slot: i64,
) -> DrawerInventory {
    DrawerInventory {
        device_id,
        drawer_id,
        level: 1,
        drawer_type: DrawerType::Big,
        capacity,
        free_slot_ids: (0..free as i64).map(|i| first_slot + i).collect(),
    }
}

// ==========================================
// CanisterBuilder - 药盒位置构建器
// ==========================================

pub struct CanisterBuilder {
    canister: CanisterSnapshot,
}

impl CanisterBuilder {
    pub fn new(canister_id: i64) -> Self {
        Self {
            canister: CanisterSnapshot {
                canister_id,
                device_id: None,
                quadrant: None,
                drawer_id: None,
                location_id: None,
                display_location: None,
                drawer_type: DrawerType::Small,
                active: true,
            },
        }
    }

    pub fn at(mut self, device_id: i64, quadrant: i32, drawer_id: i64) -> Self {
        self.canister.device_id = Some(device_id);
        self.canister.quadrant = Some(quadrant);
        self.canister.drawer_id = Some(drawer_id);
        self.canister.location_id = Some(self.canister.canister_id * 10);
        self
    }

    pub fn display(mut self, display: &str) -> Self {
        self.canister.display_location = Some(display.to_string());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.canister.active = false;
        self
    }

    pub fn build(self) -> CanisterSnapshot {
        self.canister
    }
}

// ==========================================
// CandidateBuilder - 推荐转运记录构建器
// ==========================================

pub struct CandidateBuilder {
    candidate: TransferCandidate,
}

impl CandidateBuilder {
    pub fn new(canister_id: i64) -> Self {
        Self {
            candidate: TransferCandidate {
                canister_id,
                canister_transfer_id: Some(canister_id + 5000),
                dest_device_id: None,
                dest_quadrant: None,
                dest_drawer_level: None,
                transfer_status: TransferStatus::PendingToTrolley,
            },
        }
    }

    pub fn dest(mut self, device_id: i64, quadrant: i32, level: i32) -> Self {
        self.candidate.dest_device_id = Some(device_id);
        self.candidate.dest_quadrant = Some(quadrant);
        self.candidate.dest_drawer_level = Some(level);
        self
    }

    pub fn status(mut self, status: TransferStatus) -> Self {
        self.candidate.transfer_status = status;
        self
    }

    pub fn build(self) -> TransferCandidate {
        self.candidate
    }
}

pub fn demand(canister_id: i64, pack_id: i64, order_priority: i64, qty: i64) -> DemandLine {
    DemandLine {
        canister_id,
        pack_id,
        order_priority,
        qty,
    }
}
