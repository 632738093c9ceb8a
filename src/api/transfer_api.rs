// ==========================================
// 药盒转运分配引擎 - 转运推荐 API
// ==========================================
// 职责: 批次推荐（计算 + 持久化）、推荐结果查询
// ==========================================

use std::sync::Arc;
use tracing::{error, info};

use crate::api::error::{ApiError, ApiResult};
use crate::config::AllocationConfigReader;
use crate::domain::demand::ReplenishRequirement;
use crate::domain::recommendation::BatchRecommendation;
use crate::domain::transfer::Assignment;
use crate::engine::TransferRecommendationOrchestrator;
use crate::repository::recommendation_repo::RecommendationRepository;
use crate::repository::transfer_data_source::TransferDataSource;

// ==========================================
// TransferApi - 转运推荐 API
// ==========================================

/// 转运推荐API
///
/// 职责：
/// 1. 执行批次推荐并保存结果
/// 2. 查询已保存的推荐结果
pub struct TransferApi<C, S>
where
    C: AllocationConfigReader,
    S: TransferDataSource,
{
    orchestrator: TransferRecommendationOrchestrator<C, S>,
    result_repo: Arc<RecommendationRepository>,
}

impl<C, S> TransferApi<C, S>
where
    C: AllocationConfigReader,
    S: TransferDataSource,
{
    /// 创建新的TransferApi实例
    pub fn new(config: Arc<C>, source: Arc<S>, result_repo: Arc<RecommendationRepository>) -> Self {
        Self {
            orchestrator: TransferRecommendationOrchestrator::new(config, source),
            result_repo,
        }
    }

    /// 执行批次推荐并保存
    ///
    /// # 参数
    /// - batch_id: 批次ID（> 0）
    ///
    /// # 返回
    /// - Ok(BatchRecommendation): 推荐结果（已持久化）
    /// - Err(ApiError::ExternalDependency): 配置/数据源读取或结果保存失败，批次中止，可重试
    pub async fn recommend_batch(&self, batch_id: i64) -> ApiResult<BatchRecommendation> {
        if batch_id <= 0 {
            return Err(ApiError::InvalidInput(format!("批次ID无效: {}", batch_id)));
        }

        let result = match self.orchestrator.recommend_batch(batch_id).await {
            Ok(result) => result,
            Err(e) => {
                error!(batch_id, error = %e, "转运推荐中止");
                return Err(ApiError::ExternalDependency { batch_id });
            }
        };

        if let Err(e) = self.result_repo.save(&result) {
            error!(batch_id, run_id = %result.run_id, error = %e, "推荐结果保存失败，批次中止");
            return Err(ApiError::ExternalDependency { batch_id });
        }

        info!(
            batch_id,
            run_id = %result.run_id,
            has_unassigned = result.has_unassigned(),
            "批次推荐已完成并保存"
        );
        Ok(result)
    }

    /// 查询批次最近一次推荐结果
    pub fn get_latest(&self, batch_id: i64) -> ApiResult<BatchRecommendation> {
        self.result_repo
            .load_latest(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("批次{}尚无推荐结果", batch_id)))
    }

    /// 查询批次的小车库位分配
    pub fn list_assignments(&self, batch_id: i64) -> ApiResult<Vec<Assignment>> {
        Ok(self.result_repo.load_assignments(batch_id)?)
    }

    /// 查询批次补药需求
    pub fn list_replenish_requirements(&self, batch_id: i64) -> ApiResult<Vec<ReplenishRequirement>> {
        Ok(self.result_repo.load_replenish_requirements(batch_id)?)
    }
}
