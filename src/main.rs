// ==========================================
// 药盒转运分配引擎 - 命令行入口
// ==========================================
// 用法:
//   canister-transfer [db_path] <batch_id>
//
// 未指定 db_path 时使用 CANISTER_TRANSFER_DB_PATH 或用户数据目录
// 推荐结果以 JSON 输出到 stdout
// ==========================================

use anyhow::{anyhow, bail, Context};
use canister_transfer::config::ConfigManager;
use canister_transfer::db::{
    get_default_db_path, init_schema, open_sqlite_connection, read_schema_version,
    CURRENT_SCHEMA_VERSION,
};
use canister_transfer::repository::{RecommendationRepository, SnapshotRepository};
use canister_transfer::{logging, TransferApi};
use std::sync::{Arc, Mutex};

fn parse_args(args: Vec<String>) -> anyhow::Result<(String, i64)> {
    let (db_path, raw_batch_id) = match args.as_slice() {
        [batch_id] => (get_default_db_path(), batch_id.clone()),
        [db_path, batch_id] => (db_path.clone(), batch_id.clone()),
        _ => bail!("用法: canister-transfer [db_path] <batch_id>"),
    };

    let batch_id = raw_batch_id
        .trim()
        .parse::<i64>()
        .with_context(|| format!("批次ID无效: {}", raw_batch_id))?;
    Ok((db_path, batch_id))
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let (db_path, batch_id) = parse_args(std::env::args().skip(1).collect())?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", canister_transfer::APP_NAME, canister_transfer::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    if let Some(version) = read_schema_version(&conn)? {
        if version != CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                found = version,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 与程序不一致"
            );
        }
    }
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow!("{}", e))?;
    let api = TransferApi::new(
        Arc::new(config),
        Arc::new(SnapshotRepository::from_connection(conn.clone())),
        Arc::new(RecommendationRepository::from_connection(conn)),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(api.recommend_batch(batch_id))?;

    if result.has_unassigned() {
        tracing::warn!(
            unassigned = result.unassigned.len(),
            "存在未分配小车库位的药盒，请提醒操作员"
        );
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
