// ==========================================
// 药盒转运分配引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod recommendation_repo;
pub mod snapshot_repo;
pub mod transfer_data_source;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use recommendation_repo::RecommendationRepository;
pub use snapshot_repo::SnapshotRepository;
pub use transfer_data_source::TransferDataSource;
