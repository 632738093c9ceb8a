// ==========================================
// 药盒转运分配引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建库脚本（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CANISTER_TRANSFER_DB_PATH";

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./canister_transfer.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("canister-transfer");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("canister_transfer.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 初始化数据库 schema（CREATE IF NOT EXISTS，可重复执行）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ===== 配置 =====
CREATE TABLE IF NOT EXISTS config_scope (
    scope_id TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    scope_key TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(scope_type, scope_key)
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

-- ===== 设备与库位 =====
CREATE TABLE IF NOT EXISTS device (
    device_id INTEGER PRIMARY KEY,
    device_kind TEXT NOT NULL,               -- ROBOT / CSR / ELEVATOR_TROLLEY / REGULAR_TROLLEY
    max_canisters INTEGER NOT NULL DEFAULT 0,
    disabled_locations INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS device_drawer (
    drawer_id INTEGER PRIMARY KEY,
    device_id INTEGER NOT NULL REFERENCES device(device_id),
    drawer_level INTEGER NOT NULL DEFAULT 1,
    drawer_type TEXT NOT NULL DEFAULT 'SMALL',
    capacity INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS device_location (
    location_id INTEGER PRIMARY KEY,
    drawer_id INTEGER NOT NULL REFERENCES device_drawer(drawer_id),
    quadrant INTEGER,
    display_location TEXT
);

CREATE TABLE IF NOT EXISTS canister (
    canister_id INTEGER PRIMARY KEY,
    location_id INTEGER REFERENCES device_location(location_id),
    drawer_type TEXT NOT NULL DEFAULT 'SMALL',
    active INTEGER NOT NULL DEFAULT 1,
    available_qty INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_canister_location
    ON canister(location_id) WHERE location_id IS NOT NULL;

CREATE TABLE IF NOT EXISTS canister_status_log (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    canister_id INTEGER NOT NULL REFERENCES canister(canister_id),
    action TEXT NOT NULL,                    -- DEACTIVATE / ACTIVATE / ...
    comment TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ===== 批次输入 =====
CREATE TABLE IF NOT EXISTS batch_demand (
    batch_id INTEGER NOT NULL,
    canister_id INTEGER NOT NULL,
    pack_id INTEGER NOT NULL,
    order_priority INTEGER NOT NULL DEFAULT 0,
    qty INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_batch_demand_batch ON batch_demand(batch_id);

CREATE TABLE IF NOT EXISTS canister_transfer (
    batch_id INTEGER NOT NULL,
    canister_id INTEGER NOT NULL,
    canister_transfer_id INTEGER,
    dest_device_id INTEGER,
    dest_quadrant INTEGER,
    dest_drawer_level INTEGER,
    transfer_status INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (batch_id, canister_id)
);

-- ===== 推荐结果 =====
CREATE TABLE IF NOT EXISTS transfer_run (
    run_id TEXT PRIMARY KEY,
    batch_id INTEGER NOT NULL UNIQUE,
    generated_at TEXT NOT NULL,
    skip_policy TEXT NOT NULL,
    transfer_count INTEGER NOT NULL,
    cycles_run INTEGER NOT NULL,
    deleted_canister INTEGER NOT NULL,
    result_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS replenish_requirement (
    batch_id INTEGER NOT NULL,
    canister_id INTEGER NOT NULL,
    required_qty INTEGER NOT NULL,
    available_qty INTEGER NOT NULL,
    replenish_qty INTEGER NOT NULL,
    PRIMARY KEY (batch_id, canister_id)
);

CREATE TABLE IF NOT EXISTS transfer_recommendation (
    batch_id INTEGER NOT NULL,
    canister_id INTEGER NOT NULL,
    canister_transfer_id INTEGER NOT NULL,
    transfer_status INTEGER NOT NULL,
    replenish_required INTEGER NOT NULL,
    enable_actions INTEGER NOT NULL,
    deactivated INTEGER NOT NULL,
    deactivation_comment TEXT,
    PRIMARY KEY (batch_id, canister_id)
);

CREATE TABLE IF NOT EXISTS trolley_assignment (
    batch_id INTEGER NOT NULL,
    canister_id INTEGER NOT NULL,
    location_id INTEGER NOT NULL,
    trolley_device_id INTEGER NOT NULL,
    trolley_drawer_id INTEGER NOT NULL,
    dest_device_id INTEGER NOT NULL,
    dest_quadrant INTEGER,
    dest_drawer_level INTEGER NOT NULL,
    source_device_id INTEGER,
    cycle_id INTEGER NOT NULL,
    PRIMARY KEY (batch_id, canister_id),
    UNIQUE (batch_id, cycle_id, location_id)
);
"#;
