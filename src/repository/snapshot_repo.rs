// ==========================================
// 药盒转运分配引擎 - 位置快照数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 读取: canister / device / device_drawer / device_location
//       batch_demand / canister_transfer / canister_status_log
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::canister::CanisterSnapshot;
use crate::domain::demand::DemandLine;
use crate::domain::device::{DeviceRecord, DrawerInventory};
use crate::domain::transfer::TransferCandidate;
use crate::domain::types::{DeviceKind, DrawerType, TransferStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::transfer_data_source::TransferDataSource;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// canister_status_log.action: 停用
pub const STATUS_ACTION_DEACTIVATE: &str = "DEACTIVATE";

// ==========================================
// SnapshotRepository - 位置快照仓储
// ==========================================
/// 位置快照仓储
/// 职责: 为推荐流程读取药盒、设备、抽屉与批次输入
pub struct SnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SnapshotRepository {
    /// 创建新的 SnapshotRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn query_canisters(&self) -> RepositoryResult<Vec<CanisterSnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                c.canister_id, dr.device_id, l.quadrant, l.drawer_id,
                c.location_id, l.display_location, c.drawer_type, c.active
            FROM canister c
            LEFT JOIN device_location l ON l.location_id = c.location_id
            LEFT JOIN device_drawer dr ON dr.drawer_id = l.drawer_id
            ORDER BY c.canister_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<i32>>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, bool>(7)?,
            ))
        })?;

        let mut canisters = Vec::new();
        for row in rows {
            let (canister_id, device_id, quadrant, drawer_id, location_id, display_location, drawer_type, active) =
                row?;
            canisters.push(CanisterSnapshot {
                canister_id,
                device_id,
                quadrant,
                drawer_id,
                location_id,
                display_location,
                drawer_type: parse_drawer_type(&drawer_type)?,
                active,
            });
        }
        Ok(canisters)
    }

    fn query_devices(&self) -> RepositoryResult<Vec<DeviceRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT device_id, device_kind, max_canisters, disabled_locations
            FROM device
            ORDER BY device_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut devices = Vec::new();
        for row in rows {
            let (device_id, kind, max_canisters, disabled_locations) = row?;
            let kind = DeviceKind::parse(&kind).ok_or_else(|| RepositoryError::FieldValueError {
                field: "device_kind".to_string(),
                message: format!("device_id={} 未知设备类型: {}", device_id, kind),
            })?;
            devices.push(DeviceRecord {
                device_id,
                kind,
                max_canisters,
                disabled_locations,
            });
        }
        Ok(devices)
    }

    fn query_drawers(&self) -> RepositoryResult<Vec<DrawerInventory>> {
        let conn = self.get_conn()?;

        // 空闲库位: 没有药盒占用的库位
        let mut free_stmt = conn.prepare(
            r#"
            SELECT l.drawer_id, l.location_id
            FROM device_location l
            LEFT JOIN canister c ON c.location_id = l.location_id
            WHERE c.canister_id IS NULL
            ORDER BY l.drawer_id, l.location_id
            "#,
        )?;
        let mut free_slots: HashMap<i64, Vec<i64>> = HashMap::new();
        let rows = free_stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (drawer_id, location_id) = row?;
            free_slots.entry(drawer_id).or_default().push(location_id);
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT drawer_id, device_id, drawer_level, drawer_type, capacity
            FROM device_drawer
            ORDER BY device_id, drawer_level, drawer_id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut drawers = Vec::new();
        for row in rows {
            let (drawer_id, device_id, level, drawer_type, capacity) = row?;
            if capacity < 0 {
                warn!(drawer_id, capacity, "抽屉容量为负，按 0 处理");
            }
            drawers.push(DrawerInventory {
                device_id,
                drawer_id,
                level,
                drawer_type: parse_drawer_type(&drawer_type)?,
                capacity: usize::try_from(capacity).unwrap_or(0),
                free_slot_ids: free_slots.remove(&drawer_id).unwrap_or_default(),
            });
        }
        Ok(drawers)
    }

    fn query_demand(&self, batch_id: i64) -> RepositoryResult<Vec<DemandLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT canister_id, pack_id, order_priority, qty
            FROM batch_demand
            WHERE batch_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok(DemandLine {
                canister_id: row.get(0)?,
                pack_id: row.get(1)?,
                order_priority: row.get(2)?,
                qty: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn query_available(&self, batch_id: i64) -> RepositoryResult<HashMap<i64, i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT canister_id, available_qty
            FROM canister
            WHERE canister_id IN (
                SELECT canister_id FROM batch_demand WHERE batch_id = ?1
                UNION
                SELECT canister_id FROM canister_transfer WHERE batch_id = ?1
            )
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        Ok(rows.collect::<Result<HashMap<_, _>, _>>()?)
    }

    fn query_candidates(&self, batch_id: i64) -> RepositoryResult<Vec<TransferCandidate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT canister_id, canister_transfer_id, dest_device_id,
                   dest_quadrant, dest_drawer_level, transfer_status
            FROM canister_transfer
            WHERE batch_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<i32>>(3)?,
                row.get::<_, Option<i32>>(4)?,
                row.get::<_, i32>(5)?,
            ))
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            let (canister_id, canister_transfer_id, dest_device_id, dest_quadrant, dest_drawer_level, code) = row?;
            let transfer_status = match TransferStatus::from_code(code) {
                Some(status) => status,
                None => {
                    warn!(batch_id, canister_id, code, "未知转运状态编码，记录忽略");
                    continue;
                }
            };
            candidates.push(TransferCandidate {
                canister_id,
                canister_transfer_id,
                dest_device_id,
                dest_quadrant,
                dest_drawer_level,
                transfer_status,
            });
        }
        Ok(candidates)
    }

    fn query_comments(&self, canister_ids: &[i64]) -> RepositoryResult<HashMap<i64, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT comment
            FROM canister_status_log
            WHERE canister_id = ?1 AND action = ?2
            ORDER BY log_id DESC
            LIMIT 1
            "#,
        )?;

        let mut comments = HashMap::new();
        for &canister_id in canister_ids {
            let comment: Option<String> = stmt
                .query_row(params![canister_id, STATUS_ACTION_DEACTIVATE], |row| row.get(0))
                .optional()?;
            if let Some(comment) = comment {
                comments.insert(canister_id, comment);
            }
        }
        Ok(comments)
    }
}

fn parse_drawer_type(raw: &str) -> RepositoryResult<DrawerType> {
    DrawerType::parse(raw).ok_or_else(|| RepositoryError::FieldValueError {
        field: "drawer_type".to_string(),
        message: format!("未知抽屉类型: {}", raw),
    })
}

// ==========================================
// TransferDataSource Trait 实现
// ==========================================
#[async_trait]
impl TransferDataSource for SnapshotRepository {
    async fn load_canisters(&self) -> RepositoryResult<Vec<CanisterSnapshot>> {
        self.query_canisters()
    }

    async fn load_devices(&self) -> RepositoryResult<Vec<DeviceRecord>> {
        self.query_devices()
    }

    async fn load_drawers(&self) -> RepositoryResult<Vec<DrawerInventory>> {
        self.query_drawers()
    }

    async fn load_demand(&self, batch_id: i64) -> RepositoryResult<Vec<DemandLine>> {
        self.query_demand(batch_id)
    }

    async fn load_available_quantities(&self, batch_id: i64) -> RepositoryResult<HashMap<i64, i64>> {
        self.query_available(batch_id)
    }

    async fn load_transfer_candidates(&self, batch_id: i64) -> RepositoryResult<Vec<TransferCandidate>> {
        self.query_candidates(batch_id)
    }

    async fn load_deactivation_comments(
        &self,
        canister_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, String>> {
        self.query_comments(canister_ids)
    }
}
