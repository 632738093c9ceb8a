// ==========================================
// 药盒转运分配引擎 - 推荐编排器
// ==========================================
// 用途: 协调补药计算、待转运分类、小车库位分配的执行顺序
// 红线: 任一外部依赖失败 → 整个批次中止，不返回部分结果
// ==========================================

use crate::config::{AllocationConfigReader, AllocationSettings};
use crate::domain::canister::CanisterSnapshot;
use crate::domain::demand::DemandLine;
use crate::domain::device::{DeviceRecord, DrawerInventory};
use crate::domain::recommendation::BatchRecommendation;
use crate::domain::snapshot::LocationSnapshot;
use crate::domain::transfer::TransferCandidate;
use crate::engine::{
    DrawerPool, PendingTransferClassifier, ReplenishmentCalculator, TrolleyAllocationEngine,
};
use crate::repository::error::RepositoryResult;
use crate::repository::transfer_data_source::TransferDataSource;
use chrono::Utc;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// BatchInput - 单批次输入快照
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BatchInput {
    pub batch_id: i64,
    pub canisters: Vec<CanisterSnapshot>,
    pub devices: Vec<DeviceRecord>,
    pub drawers: Vec<DrawerInventory>,
    pub demand: Vec<DemandLine>,
    pub available: HashMap<i64, i64>,
    pub candidates: Vec<TransferCandidate>,
    pub deactivation_comments: HashMap<i64, String>,
}

// ==========================================
// TransferRecommendationOrchestrator - 推荐编排器
// ==========================================

pub struct TransferRecommendationOrchestrator<C, S>
where
    C: AllocationConfigReader,
    S: TransferDataSource,
{
    config: Arc<C>,
    source: Arc<S>,
    replenishment: ReplenishmentCalculator,
}

impl<C, S> TransferRecommendationOrchestrator<C, S>
where
    C: AllocationConfigReader,
    S: TransferDataSource,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - source: 批次数据源
    pub fn new(config: Arc<C>, source: Arc<S>) -> Self {
        Self {
            config,
            source,
            replenishment: ReplenishmentCalculator::new(),
        }
    }

    /// 执行单批次推荐
    ///
    /// # 参数
    /// - batch_id: 批次ID
    ///
    /// # 返回
    /// 批次推荐结果；配置或数据源失败时返回错误，不产生部分结果
    #[instrument(skip(self))]
    pub async fn recommend_batch(&self, batch_id: i64) -> Result<BatchRecommendation, Box<dyn Error>> {
        info!(batch_id, "开始执行转运推荐");

        let settings = self.config.load_settings().await?;
        let input = self.load_input(batch_id).await?;

        Ok(self.plan(input, settings))
    }

    /// 读取批次输入（一次性快照）
    async fn load_input(&self, batch_id: i64) -> RepositoryResult<BatchInput> {
        let canisters = self.source.load_canisters().await?;
        let devices = self.source.load_devices().await?;
        let drawers = self.source.load_drawers().await?;
        let demand = self.source.load_demand(batch_id).await?;
        let available = self.source.load_available_quantities(batch_id).await?;
        let candidates = self.source.load_transfer_candidates(batch_id).await?;

        let inactive_ids: Vec<i64> = canisters
            .iter()
            .filter(|c| !c.active)
            .map(|c| c.canister_id)
            .collect();
        let deactivation_comments = if inactive_ids.is_empty() {
            HashMap::new()
        } else {
            self.source.load_deactivation_comments(&inactive_ids).await?
        };

        debug!(
            batch_id,
            canisters = canisters.len(),
            devices = devices.len(),
            drawers = drawers.len(),
            demand_lines = demand.len(),
            candidates = candidates.len(),
            "批次输入读取完成"
        );

        Ok(BatchInput {
            batch_id,
            canisters,
            devices,
            drawers,
            demand,
            available,
            candidates,
            deactivation_comments,
        })
    }

    /// 基于已读取的输入计算推荐（纯计算，不访问外部依赖）
    pub fn plan(&self, input: BatchInput, settings: AllocationSettings) -> BatchRecommendation {
        let batch_id = input.batch_id;
        let snapshot = LocationSnapshot::new(input.canisters, input.devices, input.drawers);

        // ==========================================
        // 步骤1: 存储设备容量汇总
        // ==========================================
        let device_capacities = snapshot.storage_capacities(settings.reserved_manual_fill_locations);

        // ==========================================
        // 步骤2: 补药量计算
        // ==========================================
        debug!("步骤2: 计算补药需求");
        let replenish_requirements = self.replenishment.compute(&input.available, &input.demand);
        let replenish_map: HashMap<i64, i64> = replenish_requirements
            .iter()
            .map(|r| (r.canister_id, r.replenish_qty))
            .collect();

        // ==========================================
        // 步骤3: 待转运分类
        // ==========================================
        debug!("步骤3: 待转运分类");
        let classifier = PendingTransferClassifier::new(settings.skip_policy);
        let classification = classifier.classify(
            &input.candidates,
            &snapshot,
            &replenish_map,
            &input.deactivation_comments,
        );

        // ==========================================
        // 步骤4: 小车库位分配
        // ==========================================
        debug!("步骤4: 小车库位分配");
        let pool = DrawerPool::from_snapshot(&snapshot);
        let allocator = TrolleyAllocationEngine::with_max_cycles(settings.max_transfer_cycles);
        let allocation = allocator.allocate(&classification.pending, &pool);

        if allocation.has_unassigned() {
            warn!(
                batch_id,
                unassigned = allocation.unassigned.len(),
                "小车容量不足，部分药盒未分配库位"
            );
        }

        // ==========================================
        // 步骤5: 汇总结果
        // ==========================================
        let result = BatchRecommendation {
            run_id: Uuid::new_v4().to_string(),
            batch_id,
            generated_at: Utc::now(),
            skip_policy: settings.skip_policy,
            replenish_requirements,
            transfers: classification.pending,
            remove_locations: classification.remove_locations,
            csr_drawer_removals: classification.csr_drawer_removals,
            deleted_canister: classification.deleted_canister,
            assignments: allocation.assignments,
            unassigned: allocation.unassigned,
            remaining_free_locations: allocation.remaining_free_locations,
            transfer_count: allocation.transfer_count,
            cycle_device_membership: allocation.cycle_device_membership,
            cycles_run: allocation.cycles_run,
            device_capacities,
        };

        info!(
            batch_id,
            run_id = %result.run_id,
            transfers = result.transfers.len(),
            assignments = result.assignments.len(),
            unassigned = result.unassigned.len(),
            cycles_run = result.cycles_run,
            replenish_count = result.replenish_count(),
            "转运推荐完成"
        );

        result
    }
}
