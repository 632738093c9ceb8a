// ==========================================
// 药盒转运分配引擎 - 引擎层
// ==========================================
// 职责: 实现补药、分类、分配规则,不拼 SQL
// 红线: Engine 不拼 SQL, 不访问外部依赖（编排器除外）
// ==========================================

pub mod classifier;
pub mod drawer_pool;
pub mod orchestrator;
pub mod replenishment;
pub mod trolley_allocator;

// 重导出核心引擎
pub use classifier::{ClassificationOutcome, PendingTransferClassifier};
pub use drawer_pool::{DrawerPool, PooledDrawer};
pub use orchestrator::{BatchInput, TransferRecommendationOrchestrator};
pub use replenishment::ReplenishmentCalculator;
pub use trolley_allocator::{AllocationOutcome, TrolleyAllocationEngine};
