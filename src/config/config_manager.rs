// ==========================================
// 药盒转运分配引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::allocation_config_trait::AllocationConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::SkipPolicy;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for ConfigManager {
    async fn get_skip_policy(&self) -> Result<SkipPolicy, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::TRANSFER_SKIP_POLICY, "LOCATION_AND_REPLENISH")?;
        match SkipPolicy::parse(&value) {
            Some(policy) => Ok(policy),
            None => {
                warn!(
                    config_key = config_keys::TRANSFER_SKIP_POLICY,
                    raw_value = %value,
                    "跳过规则配置无法识别，使用默认值"
                );
                Ok(SkipPolicy::default())
            }
        }
    }

    async fn get_reserved_manual_fill_locations(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::RESERVED_MANUAL_FILL_LOCATIONS, "0")?;
        Ok(value.trim().parse::<i64>().map(|v| v.max(0)).unwrap_or(0))
    }

    async fn get_max_transfer_cycles(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::MAX_TRANSFER_CYCLES, "0")?;
        Ok(value.trim().parse::<u32>().unwrap_or(0))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 跳过规则: LOCATION_ONLY / LOCATION_AND_REPLENISH
    pub const TRANSFER_SKIP_POLICY: &str = "transfer_skip_policy";

    // 存储设备预留人工加药库位
    pub const RESERVED_MANUAL_FILL_LOCATIONS: &str = "reserved_manual_fill_locations";

    // 分配周期上限
    pub const MAX_TRANSFER_CYCLES: &str = "max_transfer_cycles";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationSettings;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let config = manager();
        let settings = config.load_settings().await.unwrap();
        assert_eq!(settings, AllocationSettings::default());
        assert_eq!(settings.skip_policy, SkipPolicy::LocationAndReplenish);
    }

    #[tokio::test]
    async fn test_values_read_from_config_kv() {
        let config = manager();
        config
            .set_global_config_value(config_keys::TRANSFER_SKIP_POLICY, "location_only")
            .unwrap();
        config
            .set_global_config_value(config_keys::RESERVED_MANUAL_FILL_LOCATIONS, "4")
            .unwrap();
        config
            .set_global_config_value(config_keys::MAX_TRANSFER_CYCLES, "3")
            .unwrap();

        let settings = config.load_settings().await.unwrap();
        assert_eq!(settings.skip_policy, SkipPolicy::LocationOnly);
        assert_eq!(settings.reserved_manual_fill_locations, 4);
        assert_eq!(settings.max_transfer_cycles, 3);
    }

    #[tokio::test]
    async fn test_invalid_values_fall_back() {
        let config = manager();
        config
            .set_global_config_value(config_keys::TRANSFER_SKIP_POLICY, "sometimes")
            .unwrap();
        config
            .set_global_config_value(config_keys::RESERVED_MANUAL_FILL_LOCATIONS, "-2")
            .unwrap();
        config
            .set_global_config_value(config_keys::MAX_TRANSFER_CYCLES, "many")
            .unwrap();

        let settings = config.load_settings().await.unwrap();
        assert_eq!(settings.skip_policy, SkipPolicy::LocationAndReplenish);
        assert_eq!(settings.reserved_manual_fill_locations, 0);
        assert_eq!(settings.max_transfer_cycles, 0);
    }

    #[test]
    fn test_set_overwrites_existing() {
        let config = manager();
        config.set_global_config_value("k", "1").unwrap();
        config.set_global_config_value("k", "2").unwrap();
        assert_eq!(
            config.get_global_config_value("k").unwrap(),
            Some("2".to_string())
        );
    }
}
