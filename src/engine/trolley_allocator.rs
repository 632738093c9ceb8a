// ==========================================
// 药盒转运分配引擎 - 小车库位分配引擎
// ==========================================
// 职责: 为需经小车转运的药盒分配具体小车库位
// 输入: 待转运药盒 + 小车抽屉池
// 输出: 库位分配 + 未分配药盒 + 各轮次涉及设备
// 红线: 同一轮次内抽屉分配数 <= 抽屉容量；一个药盒至多一个分配
// ==========================================
// 多轮次: 每轮是一趟新的小车运输，从完整抽屉池开始；
//         本轮容量不足的药盒进入下一轮，显式循环而非递归
// ==========================================

use crate::domain::transfer::{Assignment, GroupKey, PendingTransfer, SourceLocation, UnassignedCanister};
use crate::domain::types::TrolleyKind;
use crate::engine::drawer_pool::{DrawerPool, PooledDrawer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, info, instrument, warn};

/// 进入分配的药盒
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RoutedCanister {
    canister_id: i64,
    source: SourceLocation,
}

type PendingBucket = BTreeMap<GroupKey, Vec<RoutedCanister>>;

// ==========================================
// AllocationOutcome - 分配结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// 按生成顺序排列的分配
    pub assignments: Vec<Assignment>,
    pub unassigned: Vec<UnassignedCanister>,
    /// 最后一轮结束后的空闲小车库位
    pub remaining_free_locations: BTreeMap<TrolleyKind, Vec<i64>>,
    pub transfer_count: usize,
    /// 轮次 → 涉及设备（源设备 + 目标设备）
    pub cycle_device_membership: BTreeMap<u32, BTreeSet<i64>>,
    pub cycles_run: u32,
}

impl AllocationOutcome {
    pub fn assignment_for(&self, canister_id: i64) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.canister_id == canister_id)
    }

    pub fn assignments_in_cycle(&self, cycle_id: u32) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(move |a| a.cycle_id == cycle_id)
    }

    /// 出现过分配的轮次（升序）
    pub fn cycle_ids(&self) -> Vec<u32> {
        let ids: BTreeSet<u32> = self.assignments.iter().map(|a| a.cycle_id).collect();
        ids.into_iter().collect()
    }

    pub fn has_unassigned(&self) -> bool {
        !self.unassigned.is_empty()
    }
}

/// 跨轮次累加器
#[derive(Debug, Default)]
struct CycleAccumulator {
    assignments: Vec<Assignment>,
    membership: BTreeMap<u32, BTreeSet<i64>>,
}

// ==========================================
// TrolleyAllocationEngine - 小车库位分配
// ==========================================
pub struct TrolleyAllocationEngine {
    max_cycles: Option<u32>,
}

impl TrolleyAllocationEngine {
    pub fn new() -> Self {
        Self { max_cycles: None }
    }

    /// 限制最大轮次（0 表示不限制）
    pub fn with_max_cycles(max_cycles: u32) -> Self {
        Self {
            max_cycles: (max_cycles > 0).then_some(max_cycles),
        }
    }

    /// 分配小车库位
    ///
    /// 流程：
    /// 1) 仅处理需经小车转运的药盒，按 (目标设备, 抽屉层, 象限) 分组
    /// 2) 每轮复制完整抽屉池，按分组顺序弹出抽屉；池只在本轮各分组间共享
    /// 3) 本轮未分配的药盒进入下一轮；剩余分组所需类型的抽屉完全不存在时停止
    ///
    /// # 参数
    /// - `pending`: 待转运药盒
    /// - `pool`: 小车抽屉池（每轮的起始状态）
    #[instrument(skip_all, fields(pending_count = pending.len()))]
    pub fn allocate(&self, pending: &[PendingTransfer], pool: &DrawerPool) -> AllocationOutcome {
        let mut bucket = group_trolley_bound(pending);
        let routed_count: usize = bucket.values().map(|v| v.len()).sum();

        let mut acc = CycleAccumulator::default();
        let mut remaining_free_locations = pool.remaining_locations();
        let mut cycle_id: u32 = 1;
        let mut cycles_run: u32 = 0;

        while !bucket.is_empty() {
            if !can_serve(pool, &bucket) {
                debug!(cycle_id, "剩余分组所需类型的抽屉不存在，停止分配");
                break;
            }
            if self.max_cycles.is_some_and(|max| cycles_run >= max) {
                warn!(cycle_id, "达到最大轮次限制，停止分配");
                break;
            }

            let mut cycle_pool = pool.clone();
            let mut leftovers: BTreeMap<TrolleyKind, Vec<i64>> = BTreeMap::new();
            let assigned_before = acc.assignments.len();
            bucket = run_cycle(cycle_id, bucket, &mut cycle_pool, &mut leftovers, &mut acc);
            cycles_run += 1;

            remaining_free_locations = cycle_pool.remaining_locations();
            for (kind, ids) in leftovers {
                remaining_free_locations.entry(kind).or_default().extend(ids);
            }

            let assigned_now = acc.assignments.len() - assigned_before;
            info!(
                cycle_id,
                assigned = assigned_now,
                carried_over = bucket.values().map(|v| v.len()).sum::<usize>(),
                "轮次分配完成"
            );
            if assigned_now == 0 {
                break;
            }
            cycle_id += 1;
        }

        for ids in remaining_free_locations.values_mut() {
            ids.sort_unstable();
        }

        let unassigned: Vec<UnassignedCanister> = bucket
            .into_iter()
            .flat_map(|(group, canisters)| {
                canisters.into_iter().map(move |c| UnassignedCanister {
                    canister_id: c.canister_id,
                    group,
                    source_device_id: c.source.device_id,
                })
            })
            .collect();

        let transfer_count = acc.assignments.len();
        debug_assert_eq!(transfer_count + unassigned.len(), routed_count);

        info!(
            routed_count,
            transfer_count,
            unassigned_count = unassigned.len(),
            cycles_run,
            "小车库位分配完成"
        );

        AllocationOutcome {
            assignments: acc.assignments,
            unassigned,
            remaining_free_locations,
            transfer_count,
            cycle_device_membership: acc.membership,
            cycles_run,
        }
    }
}

impl Default for TrolleyAllocationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单轮分配
// ==========================================

/// 执行单轮分配，返回留待下一轮的药盒
fn run_cycle(
    cycle_id: u32,
    bucket: PendingBucket,
    pool: &mut DrawerPool,
    leftovers: &mut BTreeMap<TrolleyKind, Vec<i64>>,
    acc: &mut CycleAccumulator,
) -> PendingBucket {
    let mut next: PendingBucket = BTreeMap::new();

    for (key, canisters) in bucket {
        let kind = pool.choose_kind(key.drawer_level);
        let sorted = sort_by_source_density(canisters);

        let capacity = match pool.head_capacity(kind) {
            Some(capacity) => capacity,
            None => {
                next.entry(key).or_default().extend(sorted);
                continue;
            }
        };
        let drawers_needed = sorted.len().div_ceil(capacity);
        let drawers = pool.pop_drawers(kind, drawers_needed);

        let mut locations: VecDeque<(i64, i64, i64)> = flatten_locations(&drawers);
        debug!(
            cycle_id,
            dest_device_id = key.device_id,
            drawer_level = key.drawer_level,
            quadrant = ?key.quadrant,
            trolley_kind = %kind,
            canisters = sorted.len(),
            drawers_needed,
            drawers_popped = drawers.len(),
            "分组分配"
        );

        for canister in sorted {
            match locations.pop_front() {
                Some((trolley_device_id, trolley_drawer_id, location_id)) => {
                    let members = acc.membership.entry(cycle_id).or_default();
                    if let Some(device_id) = canister.source.device_id {
                        members.insert(device_id);
                    }
                    members.insert(key.device_id);
                    acc.assignments.push(Assignment {
                        canister_id: canister.canister_id,
                        location_id,
                        trolley_device_id,
                        trolley_drawer_id,
                        dest_device_id: key.device_id,
                        dest_quadrant: key.quadrant,
                        dest_drawer_level: key.drawer_level,
                        source_device_id: canister.source.device_id,
                        cycle_id,
                    });
                }
                None => next.entry(key).or_default().push(canister),
            }
        }

        // 已弹出抽屉的剩余库位专属于该分组，本轮不回池
        leftovers
            .entry(kind)
            .or_default()
            .extend(locations.into_iter().map(|(_, _, location_id)| location_id));
    }

    next
}

/// 是否还有分组能拿到所需类型的抽屉
fn can_serve(pool: &DrawerPool, bucket: &PendingBucket) -> bool {
    bucket
        .keys()
        .any(|key| !pool.is_empty(pool.choose_kind(key.drawer_level)))
}

/// 需经小车转运的药盒按分组键归组（组内保持输入顺序）
fn group_trolley_bound(pending: &[PendingTransfer]) -> PendingBucket {
    let mut bucket: PendingBucket = BTreeMap::new();
    for transfer in pending.iter().filter(|p| p.is_trolley_bound()) {
        if let Some(key) = transfer.group_key() {
            bucket.entry(key).or_default().push(RoutedCanister {
                canister_id: transfer.canister_id,
                source: transfer.source_location(),
            });
        }
    }
    bucket
}

/// 同源位置聚集：按源位置分组，组按成员数降序（同数保持首次出现顺序），再展开
fn sort_by_source_density(canisters: Vec<RoutedCanister>) -> Vec<RoutedCanister> {
    let mut index: HashMap<SourceLocation, usize> = HashMap::new();
    let mut groups: Vec<Vec<RoutedCanister>> = Vec::new();
    for canister in canisters {
        match index.get(&canister.source) {
            Some(&i) => groups[i].push(canister),
            None => {
                index.insert(canister.source, groups.len());
                groups.push(vec![canister]);
            }
        }
    }
    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups.into_iter().flatten().collect()
}

/// (小车, 抽屉, 库位) 平铺
fn flatten_locations(drawers: &[PooledDrawer]) -> VecDeque<(i64, i64, i64)> {
    drawers
        .iter()
        .flat_map(|d| {
            d.free_slot_ids
                .iter()
                .map(move |&slot| (d.trolley_device_id, d.drawer_id, slot))
        })
        .collect()
}
