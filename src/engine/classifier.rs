// ==========================================
// 药盒转运分配引擎 - 待转运分类引擎
// ==========================================
// 职责: 对比药盒当前位置与推荐目标位置 + 转运状态，
//       产出待转运药盒及库位释放清单
// 输入: 推荐转运记录 + 位置快照 + 补药量 + 停用备注
// 输出: ClassificationOutcome
// 红线: 单条记录异常只剔除，不中断批次
// ==========================================

use crate::domain::snapshot::LocationSnapshot;
use crate::domain::transfer::{PendingTransfer, TransferCandidate};
use crate::domain::types::{DeviceKind, SkipPolicy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

// ==========================================
// ClassificationOutcome - 分类结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub pending: Vec<PendingTransfer>,
    /// 回货架药盒: 源设备 → 需释放的展示库位
    pub remove_locations: BTreeMap<i64, Vec<String>>,
    /// CSR 源药盒: 设备 → 抽屉 → 需释放的展示库位
    pub csr_drawer_removals: BTreeMap<i64, BTreeMap<i64, Vec<String>>>,
    /// 已在目标位置而跳过的药盒
    pub skipped_canister_ids: Vec<i64>,
    /// 因状态/缺少转运ID被剔除的药盒
    pub dropped_canister_ids: Vec<i64>,
    pub deleted_canister: bool,
}

// ==========================================
// PendingTransferClassifier - 待转运分类
// ==========================================
pub struct PendingTransferClassifier {
    policy: SkipPolicy,
}

impl PendingTransferClassifier {
    pub fn new(policy: SkipPolicy) -> Self {
        Self { policy }
    }

    /// 分类推荐转运记录
    ///
    /// 规则（逐条按序）：
    /// 1) 状态为 AT_PPP / SKIPPED_AND_ALTERNATE 或无转运ID → 剔除
    /// 2) 状态为 跳过/稍后替代 且目标为机器人 → enable_actions
    /// 3) replenish_required = 补药量 > 0
    /// 4) 目标 == 源（设备+象限）按跳过策略判定是否跳过
    /// 5) 目标设备为空（回货架）→ 源设备的释放库位
    /// 6) 药盒停用 → deactivated + 最近停用备注
    /// 7) 源设备为 CSR → (设备, 抽屉) 释放库位
    ///
    /// # 参数
    /// - `candidates`: 推荐转运记录（输出保持该顺序）
    /// - `snapshot`: 位置快照
    /// - `replenish`: canister_id → 补药量
    /// - `comments`: canister_id → 最近停用备注
    #[instrument(skip_all, fields(
        candidates_count = candidates.len(),
        policy = %self.policy
    ))]
    pub fn classify(
        &self,
        candidates: &[TransferCandidate],
        snapshot: &LocationSnapshot,
        replenish: &HashMap<i64, i64>,
        comments: &HashMap<i64, String>,
    ) -> ClassificationOutcome {
        let mut outcome = ClassificationOutcome::default();

        for candidate in candidates {
            // 1) 剔除
            let canister_transfer_id = match candidate.canister_transfer_id {
                Some(id) if !candidate.transfer_status.is_dropped() => id,
                _ => {
                    debug!(
                        canister_id = candidate.canister_id,
                        status = %candidate.transfer_status,
                        "记录剔除: 状态不参与或缺少转运ID"
                    );
                    outcome.dropped_canister_ids.push(candidate.canister_id);
                    continue;
                }
            };

            let placement = snapshot.placement(candidate.canister_id);
            let source_device_id = placement.and_then(|p| p.device_id);
            let source_quadrant = placement.and_then(|p| p.quadrant);

            // 2) 允许人工操作
            let dest_is_robot = candidate
                .dest_device_id
                .and_then(|id| snapshot.device_kind(id))
                == Some(DeviceKind::Robot);
            let enable_actions = dest_is_robot && candidate.transfer_status.allows_robot_actions();

            // 3) 补药需求
            let replenish_required = replenish
                .get(&candidate.canister_id)
                .map(|&qty| qty > 0)
                .unwrap_or(false);

            // 4) 已在目标位置
            let same_location = candidate.dest_device_id == source_device_id
                && candidate.dest_quadrant == source_quadrant;
            if self.should_skip(same_location, replenish_required) {
                outcome.skipped_canister_ids.push(candidate.canister_id);
                continue;
            }

            let source_display_location = placement.and_then(|p| p.display_location.clone());

            // 5) 回货架
            if candidate.dest_device_id.is_none() {
                if let (Some(device_id), Some(display)) = (source_device_id, &source_display_location) {
                    outcome
                        .remove_locations
                        .entry(device_id)
                        .or_default()
                        .push(display.clone());
                }
            }

            // 6) 停用药盒
            let active = placement.map(|p| p.active).unwrap_or(true);
            let (deactivated, deactivation_comment) = if active {
                (false, None)
            } else {
                outcome.deleted_canister = true;
                (true, comments.get(&candidate.canister_id).cloned())
            };

            // 7) CSR 源库位释放
            let source_drawer_id = placement.and_then(|p| p.drawer_id);
            if let Some(device_id) = source_device_id {
                if snapshot.device_kind(device_id) == Some(DeviceKind::Csr) {
                    if let (Some(drawer_id), Some(display)) = (source_drawer_id, &source_display_location) {
                        outcome
                            .csr_drawer_removals
                            .entry(device_id)
                            .or_default()
                            .entry(drawer_id)
                            .or_default()
                            .push(display.clone());
                    }
                }
            }

            outcome.pending.push(PendingTransfer {
                canister_id: candidate.canister_id,
                canister_transfer_id,
                source_device_id,
                source_quadrant,
                source_drawer_id,
                source_display_location,
                dest_device_id: candidate.dest_device_id,
                dest_quadrant: candidate.dest_quadrant,
                dest_drawer_level: candidate.dest_drawer_level,
                transfer_status: candidate.transfer_status,
                replenish_required,
                enable_actions,
                deactivated,
                deactivation_comment,
            });
        }

        info!(
            pending_count = outcome.pending.len(),
            skipped_count = outcome.skipped_canister_ids.len(),
            dropped_count = outcome.dropped_canister_ids.len(),
            deleted_canister = outcome.deleted_canister,
            "待转运分类完成"
        );

        outcome
    }

    fn should_skip(&self, same_location: bool, replenish_required: bool) -> bool {
        match self.policy {
            SkipPolicy::LocationOnly => same_location,
            SkipPolicy::LocationAndReplenish => same_location && !replenish_required,
        }
    }
}

impl Default for PendingTransferClassifier {
    fn default() -> Self {
        Self::new(SkipPolicy::default())
    }
}
