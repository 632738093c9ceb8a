// ==========================================
// 药盒转运分配引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行入口调用
// ==========================================

pub mod error;
pub mod transfer_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use transfer_api::TransferApi;
