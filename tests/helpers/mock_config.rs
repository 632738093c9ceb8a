// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use canister_transfer::config::AllocationConfigReader;
use canister_transfer::domain::types::SkipPolicy;
use std::error::Error;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub skip_policy: SkipPolicy,
    pub reserved_manual_fill_locations: i64,
    pub max_transfer_cycles: u32,
    pub fail: bool, // 模拟配置源不可用
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            skip_policy: SkipPolicy::LocationAndReplenish,
            reserved_manual_fill_locations: 0,
            max_transfer_cycles: 0,
            fail: false,
        }
    }

    /// 只按位置判断跳过
    pub fn location_only() -> Self {
        let mut config = Self::default();
        config.skip_policy = SkipPolicy::LocationOnly;
        config
    }

    /// 配置读取失败
    pub fn failing() -> Self {
        let mut config = Self::default();
        config.fail = true;
        config
    }
}

#[async_trait]
impl AllocationConfigReader for MockConfig {
    async fn get_skip_policy(&self) -> Result<SkipPolicy, Box<dyn Error>> {
        if self.fail {
            return Err("config store unavailable".into());
        }
        Ok(self.skip_policy)
    }

    async fn get_reserved_manual_fill_locations(&self) -> Result<i64, Box<dyn Error>> {
        Ok(self.reserved_manual_fill_locations)
    }

    async fn get_max_transfer_cycles(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.max_transfer_cycles)
    }
}
