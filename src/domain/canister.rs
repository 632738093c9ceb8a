// ==========================================
// 药盒转运分配引擎 - 药盒领域模型
// ==========================================
// 药盒由存储子系统维护，本引擎只读其当前位置
// ==========================================

use crate::domain::types::DrawerType;
use serde::{Deserialize, Serialize};

// ==========================================
// CanisterSnapshot - 药盒当前位置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanisterSnapshot {
    pub canister_id: i64,
    pub device_id: Option<i64>,     // None = 在货架上
    pub quadrant: Option<i32>,      // 机器人象限
    pub drawer_id: Option<i64>,     // 当前抽屉
    pub location_id: Option<i64>,   // 当前库位
    pub display_location: Option<String>, // 展示用库位编号 (如 "A-12")
    pub drawer_type: DrawerType,    // 药盒尺寸对应的抽屉类型
    pub active: bool,
}
