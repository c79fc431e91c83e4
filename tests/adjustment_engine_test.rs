// ==========================================
// 规则导入 + 调整引擎 集成测试
// ==========================================
// 测试目标: RuleImporter → AdjustmentRegistry → AdjustmentEngine
// 覆盖范围: JSON 规则导入、非法规则剔除、首个命中、AND 过滤、类型隔离
// ==========================================

mod helpers;

use helpers::test_data_builder::*;
use store_order_forecast::domain::types::{AdjustmentType, StageKind};
use store_order_forecast::engine::MatchKey;
use store_order_forecast::importer::ImportError;
use store_order_forecast::{
    AdjustmentEngine, AdjustmentRegistry, BaselineSelector, ForecastLine, RawAdjustmentRule,
    RuleImporter, RuleMatcher,
};

const EPS: f64 = 1e-9;

/// 基线 100 的预测行 (已启动瀑布)
fn prepared_line(region: &str, store: &str, item: &str) -> ForecastLine {
    let input = LineBuilder::new(store, item).region(region).build();
    let mut line = ForecastLine::from_input(input).unwrap();
    BaselineSelector::default().apply(&mut line);
    line
}

fn import(rules: Vec<RawAdjustmentRule>) -> AdjustmentRegistry {
    let report = RuleImporter::new().import(rules);
    assert!(report.violations.is_empty());
    report.registry
}

// ==========================================
// 导入
// ==========================================

#[test]
fn test_import_rules_from_json() {
    let json = r#"[
        {"type": "promo", "name": "Summer", "regions": ["BA"],
         "start_date": "2026-07-01", "end_date": "2026-07-07", "multiplier": 1.15},
        {"type": "ADHOC-INCREASE", "name": "Opening", "stores": ["101"],
         "start_date": "2026-07-01", "end_date": "2026-07-31", "multiplier": 1.5},
        {"type": "UNKNOWN", "name": "Bad",
         "start_date": "2026-07-01", "end_date": "2026-07-07", "multiplier": 1.1},
        {"type": "PROMO", "name": "Reversed",
         "start_date": "2026-07-09", "end_date": "2026-07-01", "multiplier": 1.1},
        {"type": "PROMO", "name": "Zero",
         "start_date": "2026-07-01", "end_date": "2026-07-07", "multiplier": 0},
        {"type": "PROMO", "name": "NoEnd", "start_date": "2026-07-01", "multiplier": 1.2},
        {"type": "PROMO", "name": "EmptyStores", "stores": [],
         "start_date": "2026-07-01", "end_date": "2026-07-07", "multiplier": 1.2}
    ]"#;
    let raw: Vec<RawAdjustmentRule> = serde_json::from_str(json).unwrap();
    let report = RuleImporter::new().import(raw);

    assert_eq!(report.accepted(), 2);
    assert_eq!(report.registry.rules_of(AdjustmentType::Promo).len(), 1);
    assert_eq!(report.registry.rules_of(AdjustmentType::AdhocIncrease).len(), 1);

    let indices: Vec<usize> = report.violations.iter().map(|v| v.index).collect();
    assert_eq!(indices, vec![2, 3, 4, 5, 6]);
    assert!(matches!(report.violations[0].error, ImportError::UnknownAdjustmentType { .. }));
    assert!(matches!(report.violations[1].error, ImportError::InvalidDateRange { .. }));
    assert!(matches!(report.violations[2].error, ImportError::InvalidMultiplier { .. }));
    assert_eq!(
        report.violations[3].error,
        ImportError::MissingField { index: 5, field: "end_date" }
    );
    assert!(matches!(report.violations[4].error, ImportError::EmptyFilter { field: "stores", .. }));

    let summaries = report.violation_summaries();
    assert_eq!(summaries[0].rule_name.as_deref(), Some("Bad"));
    assert!(!summaries[0].message.is_empty());
}

// ==========================================
// 匹配
// ==========================================

#[test]
fn test_first_matching_rule_wins_in_config_order() {
    let registry = import(vec![
        RuleBuilder::new("PROMO", "Store_Specific").stores(&["999"]).multiplier(2.0).build(),
        RuleBuilder::new("PROMO", "First").regions(&["BA"]).multiplier(1.10).build(),
        RuleBuilder::new("PROMO", "Second").multiplier(1.50).build(),
    ]);

    let mut line = prepared_line("BA", "101", "5001");
    AdjustmentEngine::new().apply(&mut line, &registry, date(2026, 7, 3));

    let promo = line.adjustment(AdjustmentType::Promo).unwrap();
    assert_eq!(promo.name, "First");
    assert_eq!(promo.count, 1);
    assert!((promo.multiplier - 1.10).abs() < EPS);

    let stages: Vec<_> = line
        .stages
        .iter()
        .filter(|s| s.kind == StageKind::Adjustment)
        .collect();
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0].name, "First");
    assert!((line.quantity - 110.0).abs() < 1e-6);
}

#[test]
fn test_filters_are_combined_with_and() {
    let registry = import(vec![RuleBuilder::new("ITEM_SPECIFIC", "BA_101_5001")
        .regions(&["BA"])
        .stores(&["101"])
        .items(&["5001"])
        .multiplier(1.2)
        .build()]);
    let engine = AdjustmentEngine::new();

    let cases = [
        (("BA", "101", "5001"), true),
        (("BA", "101", "5002"), false),
        (("BA", "102", "5001"), false),
        (("LA", "101", "5001"), false),
    ];
    for ((region, store, item), expected) in cases {
        let mut line = prepared_line(region, store, item);
        engine.apply(&mut line, &registry, date(2026, 7, 3));
        let hit = line.adjustment(AdjustmentType::ItemSpecific).unwrap().applied;
        assert_eq!(hit, expected, "{}/{}/{}", region, store, item);
    }
}

#[test]
fn test_window_bounds_are_inclusive() {
    let registry = import(vec![RuleBuilder::new("REGIONAL", "Week")
        .window(date(2026, 7, 1), date(2026, 7, 7))
        .multiplier(1.05)
        .build()]);
    let matcher = RuleMatcher::new();

    let hit = |d| {
        let key = MatchKey {
            region_code: "BA",
            store_no: "101",
            item_no: "5001",
            as_of_date: d,
        };
        matcher.find_match(&registry, AdjustmentType::Regional, &key).is_some()
    };

    assert!(!hit(date(2026, 6, 30)));
    assert!(hit(date(2026, 7, 1)));
    assert!(hit(date(2026, 7, 7)));
    assert!(!hit(date(2026, 7, 8)));
}

#[test]
fn test_rules_of_one_type_do_not_affect_others() {
    let registry = import(vec![
        RuleBuilder::new("CANNIBALISM", "Cannibal").multiplier(0.8).build(),
        RuleBuilder::new("ADHOC_DECREASE", "Cut").multiplier(0.5).build(),
    ]);

    let mut line = prepared_line("BA", "101", "5001");
    let total = AdjustmentEngine::new().apply(&mut line, &registry, date(2026, 7, 3));

    assert_eq!(line.adjustments.len(), AdjustmentType::ALL.len());
    let applied: Vec<AdjustmentType> = line
        .adjustments
        .iter()
        .filter(|a| a.applied)
        .map(|a| a.adjustment_type)
        .collect();
    assert_eq!(applied, vec![AdjustmentType::Cannibalism, AdjustmentType::AdhocDecrease]);

    // 100 × 0.8 × 0.5 = 40
    assert!((line.quantity - 40.0).abs() < 1e-6);
    assert!((total + 60.0).abs() < 1e-6);
    assert!(line.waterfall().is_consistent(1e-6));
}
