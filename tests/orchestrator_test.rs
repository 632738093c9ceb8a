// ==========================================
// 推荐编排器集成测试
// ==========================================
// 测试范围: 补药计算 → 待转运分类 → 小车库位分配 → 汇总
// 数据源: 内存 Mock（不访问数据库）
// ==========================================

mod helpers;

use canister_transfer::domain::types::{DeviceKind, TransferStatus, TrolleyKind};
use canister_transfer::domain::{CanisterSnapshot, DrawerInventory, TransferCandidate};
use canister_transfer::engine::TransferRecommendationOrchestrator;
use helpers::mock_config::MockConfig;
use helpers::mock_source::MockDataSource;
use helpers::test_data_builder::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

const SOURCE_ROBOT: i64 = 10;
const DEST_ROBOT: i64 = 20;
const TROLLEY: i64 = 50;
const BATCH: i64 = 7;

/// n 个药盒从 SOURCE_ROBOT 转运到 DEST_ROBOT 象限2 第1层
fn robot_to_robot_source(count: i64, drawers: Vec<DrawerInventory>) -> MockDataSource {
    let mut source = MockDataSource::new();
    source.devices = vec![
        device(SOURCE_ROBOT, DeviceKind::Robot),
        device(DEST_ROBOT, DeviceKind::Robot),
        device(TROLLEY, DeviceKind::RegularTrolley),
    ];
    source.drawers = drawers;
    source.canisters = (1..=count)
        .map(|id| CanisterBuilder::new(id).at(SOURCE_ROBOT, 1, 1).build())
        .collect::<Vec<CanisterSnapshot>>();
    source.candidates = (1..=count)
        .map(|id| CandidateBuilder::new(id).dest(DEST_ROBOT, 2, 1).build())
        .collect::<Vec<TransferCandidate>>();
    source
}

fn orchestrator(
    config: MockConfig,
    source: MockDataSource,
) -> TransferRecommendationOrchestrator<MockConfig, MockDataSource> {
    TransferRecommendationOrchestrator::new(Arc::new(config), Arc::new(source))
}

// ==========================================
// 场景1: 首个缺口确定补药量
// ==========================================

#[tokio::test]
async fn test_scenario_1_replenishment() {
    let mut source = MockDataSource::new();
    source.available = HashMap::from([(1, 10)]);
    source.demand = vec![demand(1, 100, 2, 7), demand(1, 99, 1, 6)];

    let result = orchestrator(MockConfig::default(), source)
        .recommend_batch(BATCH)
        .await
        .unwrap();

    assert_eq!(result.batch_id, BATCH);
    assert_eq!(result.replenish_requirements.len(), 1);
    let r = &result.replenish_requirements[0];
    assert_eq!(r.required_qty, 13);
    assert_eq!(r.replenish_qty, 3);
    assert_eq!(result.replenish_count(), 1);
}

// ==========================================
// 场景2: 跳过规则
// ==========================================

fn already_in_place_source() -> MockDataSource {
    let mut source = MockDataSource::new();
    source.devices = vec![device(SOURCE_ROBOT, DeviceKind::Robot)];
    source.canisters = vec![CanisterBuilder::new(1).at(SOURCE_ROBOT, 1, 1).build()];
    source.candidates = vec![CandidateBuilder::new(1).dest(SOURCE_ROBOT, 1, 1).build()];
    source.available = HashMap::from([(1, 2)]);
    source.demand = vec![demand(1, 100, 1, 5)];
    source
}

#[tokio::test]
async fn test_scenario_2_location_and_replenish_keeps_record() {
    let result = orchestrator(MockConfig::default(), already_in_place_source())
        .recommend_batch(BATCH)
        .await
        .unwrap();

    let transfer = result.transfer_for(1).expect("record should be kept");
    assert!(transfer.replenish_required);
    // 源与目标相同，不需要小车
    assert!(result.assignments.is_empty());
    assert!(result.unassigned.is_empty());
}

#[tokio::test]
async fn test_scenario_2_location_only_skips_record() {
    let result = orchestrator(MockConfig::location_only(), already_in_place_source())
        .recommend_batch(BATCH)
        .await
        .unwrap();

    assert!(result.transfer_for(1).is_none());
    assert_eq!(result.replenish_count(), 1);
}

// ==========================================
// 场景3: 两个抽屉装下全部药盒
// ==========================================

#[tokio::test]
async fn test_scenario_3_single_cycle_fits() {
    let drawers = vec![
        trolley_drawer(TROLLEY, 1, 3, 3, 101),
        trolley_drawer(TROLLEY, 2, 3, 3, 201),
    ];
    let result = orchestrator(MockConfig::default(), robot_to_robot_source(5, drawers))
        .recommend_batch(BATCH)
        .await
        .unwrap();

    assert_eq!(result.transfer_count, 5);
    assert_eq!(result.cycles_run, 1);
    assert!(result.assignments.iter().all(|a| a.cycle_id == 1));
    assert!(!result.has_unassigned());
    assert_eq!(
        result.remaining_free_locations.get(&TrolleyKind::Regular),
        Some(&vec![203])
    );
    assert_eq!(
        result.cycle_device_membership.get(&1),
        Some(&BTreeSet::from([SOURCE_ROBOT, DEST_ROBOT]))
    );

    let a = result.assignment_for(3).unwrap();
    assert_eq!(a.dest_device_id, DEST_ROBOT);
    assert_eq!(a.dest_quadrant, Some(2));
    assert_eq!(a.trolley_device_id, TROLLEY);
}

// ==========================================
// 场景4: 单个抽屉容量不足，分多趟小车运输
// ==========================================

#[tokio::test]
async fn test_scenario_4_overflow_runs_extra_cycles() {
    let drawers = vec![trolley_drawer(TROLLEY, 1, 3, 3, 101)];
    let result = orchestrator(MockConfig::default(), robot_to_robot_source(7, drawers))
        .recommend_batch(BATCH)
        .await
        .unwrap();

    assert_eq!(result.assignments.len(), 7);
    assert!(!result.has_unassigned());
    assert_eq!(result.cycles_run, 3);
    let per_cycle: Vec<usize> = (1..=3)
        .map(|c| result.assignments.iter().filter(|a| a.cycle_id == c).count())
        .collect();
    assert_eq!(per_cycle, vec![3, 3, 1]);
    assert_eq!(
        result.remaining_free_locations.get(&TrolleyKind::Regular),
        Some(&vec![102, 103])
    );
}

#[tokio::test]
async fn test_no_trolley_of_required_kind_reports_unassigned() {
    // 2 层目标需要升降小车，现场只有普通小车
    let mut source = robot_to_robot_source(3, vec![trolley_drawer(TROLLEY, 1, 3, 3, 101)]);
    source.candidates = (1..=3)
        .map(|id| CandidateBuilder::new(id).dest(DEST_ROBOT, 2, 2).build())
        .collect();

    let result = orchestrator(MockConfig::default(), source)
        .recommend_batch(BATCH)
        .await
        .unwrap();

    assert!(result.assignments.is_empty());
    assert_eq!(result.unassigned.len(), 3);
    assert!(result.has_unassigned());
    assert_eq!(result.cycles_run, 0);
}

// ==========================================
// 场景5: 停用药盒
// ==========================================

#[tokio::test]
async fn test_scenario_5_deactivated_canister() {
    let mut source = MockDataSource::new();
    source.devices = vec![device(SOURCE_ROBOT, DeviceKind::Robot)];
    source.canisters = vec![
        CanisterBuilder::new(1).at(SOURCE_ROBOT, 1, 1).display("A-1").inactive().build(),
    ];
    source.candidates = vec![CandidateBuilder::new(1).build()];
    source.comments = HashMap::from([(1, "cracked lid".to_string())]);

    let orchestrator = TransferRecommendationOrchestrator::new(
        Arc::new(MockConfig::default()),
        Arc::new(source),
    );
    let result = orchestrator.recommend_batch(BATCH).await.unwrap();

    assert!(result.deleted_canister);
    let transfer = result.transfer_for(1).unwrap();
    assert!(transfer.deactivated);
    assert_eq!(transfer.deactivation_comment.as_deref(), Some("cracked lid"));
    // 回货架 → 释放源库位
    assert_eq!(
        result.remove_locations.get(&SOURCE_ROBOT),
        Some(&vec!["A-1".to_string()])
    );
}

#[tokio::test]
async fn test_comments_not_loaded_without_inactive_canisters() {
    let source = Arc::new(robot_to_robot_source(2, vec![]));
    let orchestrator =
        TransferRecommendationOrchestrator::new(Arc::new(MockConfig::default()), source.clone());
    orchestrator.recommend_batch(BATCH).await.unwrap();
    assert_eq!(source.comment_call_count(), 0);
}

// ==========================================
// 状态过滤 & 人工操作
// ==========================================

#[tokio::test]
async fn test_dropped_statuses_and_enable_actions() {
    let mut source = robot_to_robot_source(3, vec![trolley_drawer(TROLLEY, 1, 4, 4, 101)]);
    source.candidates = vec![
        CandidateBuilder::new(1)
            .dest(DEST_ROBOT, 2, 1)
            .status(TransferStatus::AlternateTransferAtPpp)
            .build(),
        CandidateBuilder::new(2)
            .dest(DEST_ROBOT, 2, 1)
            .status(TransferStatus::SkippedToRobot)
            .build(),
        CandidateBuilder::new(3)
            .dest(DEST_ROBOT, 2, 1)
            .status(TransferStatus::PendingToRobot)
            .build(),
    ];

    let result = orchestrator(MockConfig::default(), source)
        .recommend_batch(BATCH)
        .await
        .unwrap();

    assert!(result.transfer_for(1).is_none());
    assert!(result.transfer_for(2).unwrap().enable_actions);
    assert!(!result.transfer_for(3).unwrap().enable_actions);
    assert_eq!(result.transfer_count, 2);
}

// ==========================================
// 外部依赖失败 → 批次中止
// ==========================================

#[tokio::test]
async fn test_data_source_failure_aborts_batch() {
    let mut source = robot_to_robot_source(3, vec![]);
    source.fail_drawers = true;

    let result = orchestrator(MockConfig::default(), source)
        .recommend_batch(BATCH)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_config_failure_aborts_batch() {
    let result = orchestrator(MockConfig::failing(), robot_to_robot_source(3, vec![]))
        .recommend_batch(BATCH)
        .await;
    assert!(result.is_err());
}

// ==========================================
// 守恒 & 容量汇总
// ==========================================

#[tokio::test]
async fn test_conservation_across_cycles() {
    // 部分占用的抽屉 → 多轮次
    let drawers = vec![
        trolley_drawer(TROLLEY, 1, 3, 1, 101),
        trolley_drawer(TROLLEY, 2, 3, 1, 201),
        trolley_drawer(TROLLEY, 3, 3, 2, 301),
    ];
    let result = orchestrator(MockConfig::default(), robot_to_robot_source(6, drawers))
        .recommend_batch(BATCH)
        .await
        .unwrap();

    let trolley_bound = result.transfers.iter().filter(|t| t.is_trolley_bound()).count();
    assert_eq!(trolley_bound, 6);
    assert_eq!(result.assignments.len() + result.unassigned.len(), trolley_bound);

    let ids: BTreeSet<i64> = result.assignments.iter().map(|a| a.canister_id).collect();
    assert_eq!(ids.len(), result.assignments.len());
    let locations: BTreeSet<(u32, i64)> = result
        .assignments
        .iter()
        .map(|a| (a.cycle_id, a.location_id))
        .collect();
    assert_eq!(locations.len(), result.assignments.len());
    // 每轮按容量估算弹出抽屉: 2 / 2 / 1 / 1
    assert!(result.unassigned.is_empty());
    assert_eq!(result.cycles_run, 4);
}

#[tokio::test]
async fn test_device_capacities_reported() {
    let mut config = MockConfig::default();
    config.reserved_manual_fill_locations = 5;
    let result = orchestrator(config, robot_to_robot_source(4, vec![]))
        .recommend_batch(BATCH)
        .await
        .unwrap();

    let ids: Vec<i64> = result.device_capacities.iter().map(|c| c.device_id).collect();
    assert_eq!(ids, vec![SOURCE_ROBOT, DEST_ROBOT]);
    let source_capacity = &result.device_capacities[0];
    assert_eq!(source_capacity.occupied, 4);
    assert_eq!(source_capacity.empty_locations, 100 - 4 - 5);
}
