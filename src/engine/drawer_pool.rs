// ==========================================
// 药盒转运分配引擎 - 小车抽屉池
// ==========================================
// 职责: 按小车类型维护空闲抽屉队列，供各分组弹出使用
// 红线: 单次分配运行独占，不跨运行共享
// ==========================================

use crate::domain::device::DrawerInventory;
use crate::domain::snapshot::LocationSnapshot;
use crate::domain::types::TrolleyKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// 池中的小车抽屉
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PooledDrawer {
    pub trolley_device_id: i64,
    pub drawer_id: i64,
    pub level: i32,
    pub capacity: usize,
    pub free_slot_ids: Vec<i64>, // 长度 <= capacity
}

impl PooledDrawer {
    fn from_inventory(drawer: &DrawerInventory) -> Self {
        let mut free_slot_ids = drawer.free_slot_ids.clone();
        free_slot_ids.truncate(drawer.capacity);
        Self {
            trolley_device_id: drawer.device_id,
            drawer_id: drawer.drawer_id,
            level: drawer.level,
            capacity: drawer.capacity,
            free_slot_ids,
        }
    }
}

// ==========================================
// DrawerPool - 空闲抽屉池
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DrawerPool {
    pools: BTreeMap<TrolleyKind, VecDeque<PooledDrawer>>,
}

impl DrawerPool {
    /// 从 (小车类型, 抽屉) 序列构建；无空闲槽位或容量为 0 的抽屉不入池
    pub fn from_drawers<'a, I>(drawers: I) -> Self
    where
        I: IntoIterator<Item = (TrolleyKind, &'a DrawerInventory)>,
    {
        let mut pools: BTreeMap<TrolleyKind, VecDeque<PooledDrawer>> = BTreeMap::new();
        for (kind, drawer) in drawers {
            if drawer.capacity == 0 || !drawer.has_free_slot() {
                continue;
            }
            pools
                .entry(kind)
                .or_default()
                .push_back(PooledDrawer::from_inventory(drawer));
        }
        Self { pools }
    }

    /// 从快照中的全部小车抽屉构建
    pub fn from_snapshot(snapshot: &LocationSnapshot) -> Self {
        Self::from_drawers(snapshot.trolley_drawers())
    }

    pub fn is_empty(&self, kind: TrolleyKind) -> bool {
        self.drawer_count(kind) == 0
    }

    pub fn drawer_count(&self, kind: TrolleyKind) -> usize {
        self.pools.get(&kind).map(|q| q.len()).unwrap_or(0)
    }

    /// 分组使用的小车类型：2 层或普通小车已耗尽 → 升降小车
    pub fn choose_kind(&self, drawer_level: i32) -> TrolleyKind {
        if drawer_level == 2 || self.is_empty(TrolleyKind::Regular) {
            TrolleyKind::Elevator
        } else {
            TrolleyKind::Regular
        }
    }

    /// 队首抽屉容量（用于估算所需抽屉数）
    pub fn head_capacity(&self, kind: TrolleyKind) -> Option<usize> {
        self.pools
            .get(&kind)
            .and_then(|q| q.front())
            .map(|d| d.capacity)
    }

    /// 弹出至多 n 个抽屉；不足时返回实际弹出的
    pub fn pop_drawers(&mut self, kind: TrolleyKind, n: usize) -> Vec<PooledDrawer> {
        match self.pools.get_mut(&kind) {
            Some(queue) => {
                let take = n.min(queue.len());
                queue.drain(..take).collect()
            }
            None => Vec::new(),
        }
    }

    /// 剩余池内空闲库位
    pub fn remaining_locations(&self) -> BTreeMap<TrolleyKind, Vec<i64>> {
        self.pools
            .iter()
            .map(|(kind, queue)| {
                let ids = queue
                    .iter()
                    .flat_map(|d| d.free_slot_ids.iter().copied())
                    .collect();
                (*kind, ids)
            })
            .collect()
    }
}
