// ==========================================
// 药盒转运分配引擎 - 配置层
// ==========================================
// 职责: 系统配置读取
// 存储: config_kv 表
// ==========================================

pub mod allocation_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use allocation_config_trait::{AllocationConfigReader, AllocationSettings};
pub use config_manager::{config_keys, ConfigManager};
