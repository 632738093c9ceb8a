// ==========================================
// 药盒转运分配引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 批次转运推荐（补药 / 分类 / 小车库位分配）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DeviceKind, DrawerType, SkipPolicy, TransferStatus, TrolleyKind};

// 领域实体
pub use domain::{
    Assignment, BatchRecommendation, CanisterSnapshot, DemandLine, DeviceCapacity, DeviceRecord,
    DrawerInventory, LocationSnapshot, PendingTransfer, ReplenishRequirement, TransferCandidate,
    UnassignedCanister,
};

// 引擎
pub use engine::{
    DrawerPool, PendingTransferClassifier, ReplenishmentCalculator, TransferRecommendationOrchestrator,
    TrolleyAllocationEngine,
};

// API
pub use api::{ApiError, ApiResult, TransferApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "药盒转运分配引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
