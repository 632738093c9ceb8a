// ==========================================
// Mock 数据源 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use canister_transfer::domain::{
    CanisterSnapshot, DemandLine, DeviceRecord, DrawerInventory, TransferCandidate,
};
use canister_transfer::repository::{RepositoryError, RepositoryResult, TransferDataSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 内存数据源
#[derive(Debug, Default)]
pub struct MockDataSource {
    pub canisters: Vec<CanisterSnapshot>,
    pub devices: Vec<DeviceRecord>,
    pub drawers: Vec<DrawerInventory>,
    pub demand: Vec<DemandLine>,
    pub available: HashMap<i64, i64>,
    pub candidates: Vec<TransferCandidate>,
    pub comments: HashMap<i64, String>,
    pub fail_drawers: bool, // 模拟抽屉库存服务不可用
    pub comment_calls: AtomicUsize,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment_call_count(&self) -> usize {
        self.comment_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferDataSource for MockDataSource {
    async fn load_canisters(&self) -> RepositoryResult<Vec<CanisterSnapshot>> {
        Ok(self.canisters.clone())
    }

    async fn load_devices(&self) -> RepositoryResult<Vec<DeviceRecord>> {
        Ok(self.devices.clone())
    }

    async fn load_drawers(&self) -> RepositoryResult<Vec<DrawerInventory>> {
        if self.fail_drawers {
            return Err(RepositoryError::DatabaseConnectionError(
                "drawer inventory unavailable".to_string(),
            ));
        }
        Ok(self.drawers.clone())
    }

    async fn load_demand(&self, _batch_id: i64) -> RepositoryResult<Vec<DemandLine>> {
        Ok(self.demand.clone())
    }

    async fn load_available_quantities(&self, _batch_id: i64) -> RepositoryResult<HashMap<i64, i64>> {
        Ok(self.available.clone())
    }

    async fn load_transfer_candidates(&self, _batch_id: i64) -> RepositoryResult<Vec<TransferCandidate>> {
        Ok(self.candidates.clone())
    }

    async fn load_deactivation_comments(
        &self,
        canister_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, String>> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(canister_ids
            .iter()
            .filter_map(|id| self.comments.get(id).map(|c| (*id, c.clone())))
            .collect())
    }
}
