// ==========================================
// 药盒转运分配引擎 - 推荐结果数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 写入: transfer_run / replenish_requirement /
//       transfer_recommendation / trolley_assignment
// 同一批次重复保存时先删除旧结果（单事务，可重试）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::demand::ReplenishRequirement;
use crate::domain::recommendation::BatchRecommendation;
use crate::domain::transfer::Assignment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

// ==========================================
// RecommendationRepository - 推荐结果仓储
// ==========================================
pub struct RecommendationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecommendationRepository {
    /// 创建新的 RecommendationRepository 实例
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

    /// 保存批次推荐结果（单事务，覆盖该批次旧结果）
    ///
    /// # 返回
    /// - Ok(usize): 写入的分配条数
    /// - Err: 数据库错误（整个事务回滚）
    pub fn save(&self, result: &BatchRecommendation) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        Self::delete_batch_tx(&tx, result.batch_id)?;
        Self::insert_run_tx(&tx, result)?;
        Self::insert_requirements_tx(&tx, result.batch_id, &result.replenish_requirements)?;
        Self::insert_transfers_tx(&tx, result)?;
        let count = Self::insert_assignments_tx(&tx, result.batch_id, &result.assignments)?;

        tx.commit()?;

        info!(
            batch_id = result.batch_id,
            run_id = %result.run_id,
            assignments = count,
            "批次推荐结果已保存"
        );
        Ok(count)
    }

    fn delete_batch_tx(tx: &Transaction, batch_id: i64) -> RepositoryResult<()> {
        for table in [
            "transfer_run",
            "replenish_requirement",
            "transfer_recommendation",
            "trolley_assignment",
        ] {
            tx.execute(
                &format!("DELETE FROM {} WHERE batch_id = ?1", table),
                params![batch_id],
            )?;
        }
        Ok(())
    }

    fn insert_run_tx(tx: &Transaction, result: &BatchRecommendation) -> RepositoryResult<()> {
        let result_json = serde_json::to_string(result)?;
        tx.execute(
            r#"
            INSERT INTO transfer_run (
                run_id, batch_id, generated_at, skip_policy,
                transfer_count, cycles_run, deleted_canister, result_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                result.run_id,
                result.batch_id,
                result.generated_at.to_rfc3339(),
                result.skip_policy.to_string(),
                result.transfer_count as i64,
                result.cycles_run,
                result.deleted_canister,
                result_json,
            ],
        )?;
        Ok(())
    }

    fn insert_requirements_tx(
        tx: &Transaction,
        batch_id: i64,
        requirements: &[ReplenishRequirement],
    ) -> RepositoryResult<()> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO replenish_requirement (
                batch_id, canister_id, required_qty, available_qty, replenish_qty
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        for r in requirements {
            stmt.execute(params![
                batch_id,
                r.canister_id,
                r.required_qty,
                r.available_qty,
                r.replenish_qty,
            ])?;
        }
        Ok(())
    }

    fn insert_transfers_tx(tx: &Transaction, result: &BatchRecommendation) -> RepositoryResult<()> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO transfer_recommendation (
                batch_id, canister_id, canister_transfer_id, transfer_status,
                replenish_required, enable_actions, deactivated, deactivation_comment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        for t in &result.transfers {
            stmt.execute(params![
                result.batch_id,
                t.canister_id,
                t.canister_transfer_id,
                t.transfer_status.code(),
                t.replenish_required,
                t.enable_actions,
                t.deactivated,
                t.deactivation_comment,
            ])?;
        }
        Ok(())
    }

    fn insert_assignments_tx(
        tx: &Transaction,
        batch_id: i64,
        assignments: &[Assignment],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO trolley_assignment (
                batch_id, canister_id, location_id, trolley_device_id, trolley_drawer_id,
                dest_device_id, dest_quadrant, dest_drawer_level, source_device_id, cycle_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )?;

        let mut count = 0;
        for a in assignments {
            stmt.execute(params![
                batch_id,
                a.canister_id,
                a.location_id,
                a.trolley_device_id,
                a.trolley_drawer_id,
                a.dest_device_id,
                a.dest_quadrant,
                a.dest_drawer_level,
                a.source_device_id,
                a.cycle_id,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    /// 查询批次的小车库位分配（按周期、库位排序）
    pub fn load_assignments(&self, batch_id: i64) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT canister_id, location_id, trolley_device_id, trolley_drawer_id,
                   dest_device_id, dest_quadrant, dest_drawer_level, source_device_id, cycle_id
            FROM trolley_assignment
            WHERE batch_id = ?1
            ORDER BY cycle_id, location_id
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok(Assignment {
                canister_id: row.get(0)?,
                location_id: row.get(1)?,
                trolley_device_id: row.get(2)?,
                trolley_drawer_id: row.get(3)?,
                dest_device_id: row.get(4)?,
                dest_quadrant: row.get(5)?,
                dest_drawer_level: row.get(6)?,
                source_device_id: row.get(7)?,
                cycle_id: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 查询批次补药需求（按药盒ID排序）
    pub fn load_replenish_requirements(&self, batch_id: i64) -> RepositoryResult<Vec<ReplenishRequirement>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT canister_id, required_qty, available_qty, replenish_qty
            FROM replenish_requirement
            WHERE batch_id = ?1
            ORDER BY canister_id
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok(ReplenishRequirement {
                canister_id: row.get(0)?,
                required_qty: row.get(1)?,
                available_qty: row.get(2)?,
                replenish_qty: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 读取批次最近一次完整推荐结果
    ///
    /// # 返回
    /// - Ok(None): 该批次尚未推荐
    pub fn load_latest(&self, batch_id: i64) -> RepositoryResult<Option<BatchRecommendation>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT result_json FROM transfer_run WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
