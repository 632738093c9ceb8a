// ==========================================
// 药盒转运分配引擎 - 补药量计算引擎
// ==========================================
// 职责: 按订单优先级累计药盒需求，求批次开始前需补药量
// 输入: 药盒现有量 + 需求行（任意顺序）
// 输出: ReplenishRequirement（按药盒ID排序）
// 红线: replenish_qty >= 0
// ==========================================

use crate::domain::demand::{DemandLine, ReplenishRequirement};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

// ==========================================
// ReplenishmentCalculator - 补药量计算
// ==========================================
pub struct ReplenishmentCalculator {
    // 无状态引擎
}

/// 单药盒累计状态
#[derive(Debug, Default)]
struct RunningBalance {
    balance: i64,
    required_qty: i64,
    replenish_qty: Option<i64>, // 首个缺口一旦出现即固定
}

impl ReplenishmentCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算补药需求
    ///
    /// 规则：
    /// 1) 需求行按 order_priority 升序（稳定排序，同优先级保持输入顺序）
    /// 2) required_qty 累计全部需求
    /// 3) 余量 = available - 累计需求；首次 < 0 时 replenish = -余量，此后不再变化
    /// 4) 负的现有量/需求量按 0 处理
    /// 5) 无需求的药盒: required = 0, replenish = 0
    ///
    /// # 参数
    /// - `available`: canister_id → 现有量
    /// - `demand`: 需求行
    pub fn compute(
        &self,
        available: &HashMap<i64, i64>,
        demand: &[DemandLine],
    ) -> Vec<ReplenishRequirement> {
        let mut ordered: Vec<&DemandLine> = demand.iter().collect();
        ordered.sort_by_key(|line| line.order_priority);

        let mut balances: BTreeMap<i64, RunningBalance> = BTreeMap::new();
        for (&canister_id, &qty) in available {
            balances.insert(
                canister_id,
                RunningBalance {
                    balance: clamp_non_negative(canister_id, qty, "available_qty"),
                    ..Default::default()
                },
            );
        }

        for line in ordered {
            let qty = clamp_non_negative(line.canister_id, line.qty, "demand_qty");
            let entry = balances.entry(line.canister_id).or_default();
            entry.required_qty += qty;

            if entry.replenish_qty.is_some() {
                continue;
            }

            entry.balance -= qty;
            if entry.balance < 0 {
                entry.replenish_qty = Some(-entry.balance);
                debug!(
                    canister_id = line.canister_id,
                    pack_id = line.pack_id,
                    order_priority = line.order_priority,
                    replenish_qty = -entry.balance,
                    "首个缺口出现，补药量固定"
                );
            }
        }

        balances
            .into_iter()
            .map(|(canister_id, state)| {
                let available_qty = available
                    .get(&canister_id)
                    .copied()
                    .unwrap_or(0)
                    .max(0);
                ReplenishRequirement {
                    canister_id,
                    required_qty: state.required_qty,
                    available_qty,
                    replenish_qty: state.replenish_qty.unwrap_or(0),
                }
            })
            .collect()
    }
}

fn clamp_non_negative(canister_id: i64, qty: i64, field: &str) -> i64 {
    if qty < 0 {
        warn!(canister_id, qty, field, "数量为负，按 0 处理");
        0
    } else {
        qty
    }
}

impl Default for ReplenishmentCalculator {
    fn default() -> Self {
        Self::new()
    }
}
