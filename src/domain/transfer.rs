// ==========================================
// 药盒转运分配引擎 - 转运领域模型
// ==========================================
// PendingTransfer / Assignment 每次分配运行新建，运行结束即丢弃
// 持久化由调用方负责
// ==========================================

use crate::domain::types::TransferStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// TransferCandidate - 推荐转运记录（外部推荐结果）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCandidate {
    pub canister_id: i64,
    pub canister_transfer_id: Option<i64>,
    pub dest_device_id: Option<i64>, // None = 回货架
    pub dest_quadrant: Option<i32>,
    pub dest_drawer_level: Option<i32>,
    pub transfer_status: TransferStatus,
}

// ==========================================
// PendingTransfer - 待转运药盒
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub canister_id: i64,
    pub canister_transfer_id: i64,

    // ===== 源位置 =====
    pub source_device_id: Option<i64>,
    pub source_quadrant: Option<i32>,
    pub source_drawer_id: Option<i64>,
    pub source_display_location: Option<String>,

    // ===== 目标位置 =====
    pub dest_device_id: Option<i64>,
    pub dest_quadrant: Option<i32>,
    pub dest_drawer_level: Option<i32>,

    // ===== 状态 =====
    pub transfer_status: TransferStatus,
    pub replenish_required: bool,
    pub enable_actions: bool,
    pub deactivated: bool,
    pub deactivation_comment: Option<String>,
}

impl PendingTransfer {
    /// 需要经小车转运：目标设备存在且与源设备不同
    pub fn is_trolley_bound(&self) -> bool {
        match self.dest_device_id {
            Some(dest) => self.source_device_id != Some(dest),
            None => false,
        }
    }

    /// 分组键（目标设备, 抽屉层, 象限），缺省层按 1 层处理
    pub fn group_key(&self) -> Option<GroupKey> {
        self.dest_device_id.map(|device_id| GroupKey {
            device_id,
            drawer_level: self.dest_drawer_level.unwrap_or(1),
            quadrant: self.dest_quadrant,
        })
    }

    pub fn source_location(&self) -> SourceLocation {
        SourceLocation {
            device_id: self.source_device_id,
            quadrant: self.source_quadrant,
            drawer_id: self.source_drawer_id,
        }
    }
}

// ==========================================
// GroupKey - 分配分组键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub device_id: i64,
    pub drawer_level: i32,
    pub quadrant: Option<i32>,
}

/// 源物理位置（用于同位聚集排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub device_id: Option<i64>,
    pub quadrant: Option<i32>,
    pub drawer_id: Option<i64>,
}

// ==========================================
// Assignment - 小车库位分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub canister_id: i64,
    pub location_id: i64,       // 小车库位
    pub trolley_device_id: i64, // 所在小车
    pub trolley_drawer_id: i64, // 所在抽屉
    pub dest_device_id: i64,
    pub dest_quadrant: Option<i32>,
    pub dest_drawer_level: i32,
    pub source_device_id: Option<i64>,
    pub cycle_id: u32,
}

// ==========================================
// UnassignedCanister - 未分配药盒
// ==========================================
// 容量耗尽不是错误，原样返回由调用方决定是否提醒
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedCanister {
    pub canister_id: i64,
    pub group: GroupKey,
    pub source_device_id: Option<i64>,
}
