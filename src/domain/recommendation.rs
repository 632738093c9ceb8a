// ==========================================
// 药盒转运分配引擎 - 批次推荐结果
// ==========================================
// 职责: 一次批次推荐的完整输出（可序列化、可持久化）
// ==========================================

use crate::domain::demand::ReplenishRequirement;
use crate::domain::device::DeviceCapacity;
use crate::domain::transfer::{Assignment, PendingTransfer, UnassignedCanister};
use crate::domain::types::{SkipPolicy, TrolleyKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// BatchRecommendation - 批次推荐
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecommendation {
    // 运行标识
    pub run_id: String,
    pub batch_id: i64,
    pub generated_at: DateTime<Utc>,
    pub skip_policy: SkipPolicy,

    // 补药
    pub replenish_requirements: Vec<ReplenishRequirement>,

    // 分类
    pub transfers: Vec<PendingTransfer>,
    pub remove_locations: BTreeMap<i64, Vec<String>>,
    pub csr_drawer_removals: BTreeMap<i64, BTreeMap<i64, Vec<String>>>,
    pub deleted_canister: bool,

    // 分配
    pub assignments: Vec<Assignment>,
    pub unassigned: Vec<UnassignedCanister>,
    pub remaining_free_locations: BTreeMap<TrolleyKind, Vec<i64>>,
    pub transfer_count: usize,
    pub cycle_device_membership: BTreeMap<u32, BTreeSet<i64>>,
    pub cycles_run: u32,

    // 存储设备容量
    pub device_capacities: Vec<DeviceCapacity>,
}

impl BatchRecommendation {
    /// 是否有药盒因小车容量耗尽未分配（需提醒操作员）
    pub fn has_unassigned(&self) -> bool {
        !self.unassigned.is_empty()
    }

    pub fn assignment_for(&self, canister_id: i64) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.canister_id == canister_id)
    }

    pub fn transfer_for(&self, canister_id: i64) -> Option<&PendingTransfer> {
        self.transfers.iter().find(|t| t.canister_id == canister_id)
    }

    /// 需补药的药盒数
    pub fn replenish_count(&self) -> usize {
        self.replenish_requirements
            .iter()
            .filter(|r| r.is_required())
            .count()
    }
}
