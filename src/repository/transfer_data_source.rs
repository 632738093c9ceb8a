// ==========================================
// 药盒转运分配引擎 - 批次数据源 Trait
// ==========================================
// 职责: 定义推荐流程所需的只读数据访问接口（不包含业务逻辑）
// 红线: 数据源只做读取，不做分类/分配
// ==========================================

use crate::domain::canister::CanisterSnapshot;
use crate::domain::demand::DemandLine;
use crate::domain::device::{DeviceRecord, DrawerInventory};
use crate::domain::transfer::TransferCandidate;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// TransferDataSource Trait
// ==========================================
// 用途: 编排器每个批次读取一次，组成不可变快照
// 实现者: SnapshotRepository（使用 rusqlite）
#[async_trait]
pub trait TransferDataSource: Send + Sync {
    /// 全部药盒当前位置
    async fn load_canisters(&self) -> RepositoryResult<Vec<CanisterSnapshot>>;

    /// 全部设备
    async fn load_devices(&self) -> RepositoryResult<Vec<DeviceRecord>>;

    /// 全部抽屉及其空闲库位
    async fn load_drawers(&self) -> RepositoryResult<Vec<DrawerInventory>>;

    /// 批次需求行
    ///
    /// # 参数
    /// - batch_id: 批次ID
    async fn load_demand(&self, batch_id: i64) -> RepositoryResult<Vec<DemandLine>>;

    /// 批次涉及药盒的现有量
    ///
    /// # 返回
    /// - canister_id → 现有量
    async fn load_available_quantities(&self, batch_id: i64) -> RepositoryResult<HashMap<i64, i64>>;

    /// 批次推荐转运记录（保持存储顺序）
    async fn load_transfer_candidates(&self, batch_id: i64) -> RepositoryResult<Vec<TransferCandidate>>;

    /// 停用药盒的最近备注
    ///
    /// # 参数
    /// - canister_ids: 需查询的药盒
    ///
    /// # 返回
    /// - canister_id → 备注（无备注的药盒不出现）
    async fn load_deactivation_comments(
        &self,
        canister_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, String>>;
}
