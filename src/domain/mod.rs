// ==========================================
// 药盒转运分配引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod canister;
pub mod demand;
pub mod device;
pub mod recommendation;
pub mod snapshot;
pub mod transfer;
pub mod types;

// 重导出核心类型
pub use canister::CanisterSnapshot;
pub use demand::{DemandLine, ReplenishRequirement};
pub use device::{DeviceCapacity, DeviceRecord, DrawerInventory};
pub use recommendation::BatchRecommendation;
pub use snapshot::LocationSnapshot;
pub use transfer::{
    Assignment, GroupKey, PendingTransfer, SourceLocation, TransferCandidate, UnassignedCanister,
};
pub use types::{DeviceKind, DrawerType, SkipPolicy, TransferStatus, TrolleyKind};
