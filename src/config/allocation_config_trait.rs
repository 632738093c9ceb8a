// ==========================================
// 药盒转运分配引擎 - 分配配置读取 Trait
// ==========================================
// 职责: 定义转运推荐流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::SkipPolicy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// AllocationSettings - 单批次配置快照
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AllocationSettings {
    pub skip_policy: SkipPolicy,
    pub reserved_manual_fill_locations: i64,
    pub max_transfer_cycles: u32, // 0 = 不限制
}

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 用途: 编排器在每个批次开始时读取一次
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    /// 获取跳过规则
    ///
    /// # 返回
    /// - SkipPolicy::LocationAndReplenish: 同时需要源库位与补药需求才保留
    /// - SkipPolicy::LocationOnly: 只要求源库位
    ///
    /// # 默认值
    /// - LOCATION_AND_REPLENISH
    async fn get_skip_policy(&self) -> Result<SkipPolicy, Box<dyn Error>>;

    /// 每台存储设备预留的人工加药库位数
    ///
    /// # 默认值
    /// - 0
    async fn get_reserved_manual_fill_locations(&self) -> Result<i64, Box<dyn Error>>;

    /// 最大分配周期数（0 表示不限制）
    ///
    /// # 默认值
    /// - 0
    async fn get_max_transfer_cycles(&self) -> Result<u32, Box<dyn Error>>;

    /// 一次性读取全部分配配置
    async fn load_settings(&self) -> Result<AllocationSettings, Box<dyn Error>> {
        let skip_policy = self.get_skip_policy().await?;
        let reserved_manual_fill_locations = self.get_reserved_manual_fill_locations().await?;
        let max_transfer_cycles = self.get_max_transfer_cycles().await?;

        Ok(AllocationSettings {
            skip_policy,
            reserved_manual_fill_locations,
            max_transfer_cycles,
        })
    }
}
