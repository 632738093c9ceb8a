// ==========================================
// 药盒转运分配引擎 - 需求与补药模型
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DemandLine - 分包需求行
// ==========================================
// order_priority 越小越优先（最早到期）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandLine {
    pub canister_id: i64,
    pub pack_id: i64,
    pub order_priority: i64,
    pub qty: i64,
}

// ==========================================
// ReplenishRequirement - 补药需求
// ==========================================
// 红线: 0 <= replenish_qty <= max(0, required_qty - available_qty)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishRequirement {
    pub canister_id: i64,
    pub required_qty: i64, // 全部累计需求
    pub available_qty: i64,
    pub replenish_qty: i64,
}

impl ReplenishRequirement {
    pub fn is_required(&self) -> bool {
        self.replenish_qty > 0
    }
}
