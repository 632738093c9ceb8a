// ==========================================
// 药盒转运分配引擎 - 领域类型定义
// ==========================================
// 职责: 设备类型、抽屉类型、转运状态等封闭枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 设备类型 (Device Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceKind {
    Robot,           // 分包机器人
    Csr,             // 中央存储货架
    ElevatorTrolley, // 升降小车
    RegularTrolley,  // 普通小车
}

impl DeviceKind {
    /// 是否为转运小车
    pub fn is_trolley(&self) -> bool {
        matches!(self, DeviceKind::ElevatorTrolley | DeviceKind::RegularTrolley)
    }

    /// 对应的小车类型（非小车设备返回 None）
    pub fn trolley_kind(&self) -> Option<TrolleyKind> {
        match self {
            DeviceKind::ElevatorTrolley => Some(TrolleyKind::Elevator),
            DeviceKind::RegularTrolley => Some(TrolleyKind::Regular),
            _ => None,
        }
    }

    /// 从字符串解析设备类型
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ROBOT" => Some(DeviceKind::Robot),
            "CSR" => Some(DeviceKind::Csr),
            "ELEVATOR_TROLLEY" => Some(DeviceKind::ElevatorTrolley),
            "REGULAR_TROLLEY" => Some(DeviceKind::RegularTrolley),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Robot => write!(f, "ROBOT"),
            DeviceKind::Csr => write!(f, "CSR"),
            DeviceKind::ElevatorTrolley => write!(f, "ELEVATOR_TROLLEY"),
            DeviceKind::RegularTrolley => write!(f, "REGULAR_TROLLEY"),
        }
    }
}

// ==========================================
// 小车类型 (Trolley Kind)
// ==========================================
// 抽屉池按小车类型划分
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrolleyKind {
    Elevator,
    Regular,
}

impl fmt::Display for TrolleyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrolleyKind::Elevator => write!(f, "ELEVATOR"),
            TrolleyKind::Regular => write!(f, "REGULAR"),
        }
    }
}

// ==========================================
// 抽屉尺寸 (Drawer Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawerType {
    Small,
    Big,
}

impl DrawerType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SMALL" => Some(DrawerType::Small),
            "BIG" => Some(DrawerType::Big),
            _ => None,
        }
    }
}

impl fmt::Display for DrawerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawerType::Small => write!(f, "SMALL"),
            DrawerType::Big => write!(f, "BIG"),
        }
    }
}

// ==========================================
// 转运状态 (Transfer Status)
// ==========================================
// 持久化编码: 声明顺序 0..=7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    AtDestination,          // 已在目标位置
    PendingToTrolley,       // 待转运至小车
    PendingToRobot,         // 待转运至机器人
    SkippedToTrolley,       // 跳过(小车)
    SkippedToRobot,         // 跳过(机器人)
    AlternateTransferLater, // 替代药盒稍后转运
    AlternateTransferAtPpp, // 替代药盒在PPP转运
    SkippedAndAlternate,    // 跳过且已替代
}

impl TransferStatus {
    const ALL: [TransferStatus; 8] = [
        TransferStatus::AtDestination,
        TransferStatus::PendingToTrolley,
        TransferStatus::PendingToRobot,
        TransferStatus::SkippedToTrolley,
        TransferStatus::SkippedToRobot,
        TransferStatus::AlternateTransferLater,
        TransferStatus::AlternateTransferAtPpp,
        TransferStatus::SkippedAndAlternate,
    ];

    /// 持久化编码
    pub fn code(&self) -> i32 {
        match self {
            TransferStatus::AtDestination => 0,
            TransferStatus::PendingToTrolley => 1,
            TransferStatus::PendingToRobot => 2,
            TransferStatus::SkippedToTrolley => 3,
            TransferStatus::SkippedToRobot => 4,
            TransferStatus::AlternateTransferLater => 5,
            TransferStatus::AlternateTransferAtPpp => 6,
            TransferStatus::SkippedAndAlternate => 7,
        }
    }

    /// 从持久化编码解析（未知编码返回 None）
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }

    /// 该状态的记录不参与本轮推荐
    pub fn is_dropped(&self) -> bool {
        matches!(
            self,
            TransferStatus::AlternateTransferAtPpp | TransferStatus::SkippedAndAlternate
        )
    }

    /// 该状态在目标为机器人时允许人工操作
    pub fn allows_robot_actions(&self) -> bool {
        matches!(
            self,
            TransferStatus::SkippedToTrolley
                | TransferStatus::SkippedToRobot
                | TransferStatus::AlternateTransferLater
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStatus::AtDestination => write!(f, "AT_DESTINATION"),
            TransferStatus::PendingToTrolley => write!(f, "PENDING_TO_TROLLEY"),
            TransferStatus::PendingToRobot => write!(f, "PENDING_TO_ROBOT"),
            TransferStatus::SkippedToTrolley => write!(f, "SKIPPED_TO_TROLLEY"),
            TransferStatus::SkippedToRobot => write!(f, "SKIPPED_TO_ROBOT"),
            TransferStatus::AlternateTransferLater => write!(f, "ALTERNATE_TRANSFER_LATER"),
            TransferStatus::AlternateTransferAtPpp => write!(f, "ALTERNATE_TRANSFER_AT_PPP"),
            TransferStatus::SkippedAndAlternate => write!(f, "SKIPPED_AND_ALTERNATE"),
        }
    }
}

// ==========================================
// 跳过策略 (Skip Policy)
// ==========================================
// LocationOnly: 位置一致即跳过（v3 口径，忽略补药需求）
// LocationAndReplenish: 位置一致且无需补药才跳过（旧口径）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipPolicy {
    LocationOnly,
    #[default]
    LocationAndReplenish,
}

impl SkipPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOCATION_ONLY" | "V3" => Some(SkipPolicy::LocationOnly),
            "LOCATION_AND_REPLENISH" | "LEGACY" => Some(SkipPolicy::LocationAndReplenish),
            _ => None,
        }
    }
}

impl fmt::Display for SkipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipPolicy::LocationOnly => write!(f, "LOCATION_ONLY"),
            SkipPolicy::LocationAndReplenish => write!(f, "LOCATION_AND_REPLENISH"),
        }
    }
}
