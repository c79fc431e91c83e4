// ==========================================
// 门店订货预测系统 - 聚合领域模型
// ==========================================
// 职责: (区域|门店, 日期) 维度的瀑布汇总行
// 红线: 合并满足交换律与结合律 (纯求和)
// ==========================================

use crate::domain::types::{AdjustmentType, BaselineSource, StageKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// AggregateLevel - 聚合维度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateLevel {
    Region,
    Store,
}

/// 数量 + 行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QtyCount {
    pub qty: f64,
    pub count: u64,
}

impl QtyCount {
    pub fn add(&mut self, qty: f64) {
        self.qty += qty;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &QtyCount) {
        self.qty += other.qty;
        self.count += other.count;
    }
}

// ==========================================
// AggregateRow - 汇总行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub level: AggregateLevel,
    pub key: String, // region_code 或 store_no
    pub date_forecast: NaiveDate,

    pub line_count: u64,
    pub lw_sold: f64,
    pub lw_shipped: f64,

    pub baseline_by_source: BTreeMap<BaselineSource, QtyCount>,
    pub adjustment_by_type: BTreeMap<AdjustmentType, QtyCount>,
    pub stage_by_kind: BTreeMap<StageKind, QtyCount>,

    pub rounding_up: QtyCount,
    pub rounding_down: QtyCount,
    pub store_pass_growth: QtyCount,
    pub store_pass_decline: QtyCount,
    pub weather: QtyCount,

    pub pre_store_pass_qty: f64,
    pub pre_weather_qty: f64,
    pub final_units: u64,
    pub final_cases: u64,
    pub anomaly_count: u64,
}

impl AggregateRow {
    pub fn empty(level: AggregateLevel, key: impl Into<String>, date_forecast: NaiveDate) -> Self {
        Self {
            level,
            key: key.into(),
            date_forecast,
            line_count: 0,
            lw_sold: 0.0,
            lw_shipped: 0.0,
            baseline_by_source: BTreeMap::new(),
            adjustment_by_type: BTreeMap::new(),
            stage_by_kind: BTreeMap::new(),
            rounding_up: QtyCount::default(),
            rounding_down: QtyCount::default(),
            store_pass_growth: QtyCount::default(),
            store_pass_decline: QtyCount::default(),
            weather: QtyCount::default(),
            pre_store_pass_qty: 0.0,
            pre_weather_qty: 0.0,
            final_units: 0,
            final_cases: 0,
            anomaly_count: 0,
        }
    }

    /// 合并同键汇总行
    pub fn merge(&mut self, other: &AggregateRow) {
        self.line_count += other.line_count;
        self.lw_sold += other.lw_sold;
        self.lw_shipped += other.lw_shipped;

        merge_map(&mut self.baseline_by_source, &other.baseline_by_source);
        merge_map(&mut self.adjustment_by_type, &other.adjustment_by_type);
        merge_map(&mut self.stage_by_kind, &other.stage_by_kind);

        self.rounding_up.merge(&other.rounding_up);
        self.rounding_down.merge(&other.rounding_down);
        self.store_pass_growth.merge(&other.store_pass_growth);
        self.store_pass_decline.merge(&other.store_pass_decline);
        self.weather.merge(&other.weather);

        self.pre_store_pass_qty += other.pre_store_pass_qty;
        self.pre_weather_qty += other.pre_weather_qty;
        self.final_units += other.final_units;
        self.final_cases += other.final_cases;
        self.anomaly_count += other.anomaly_count;
    }
}

fn merge_map<K: Ord + Copy>(target: &mut BTreeMap<K, QtyCount>, source: &BTreeMap<K, QtyCount>) {
    for (k, v) in source {
        target.entry(*k).or_default().merge(v);
    }
}

// ==========================================
// AggregationReport - 聚合报告
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationReport {
    pub rows: Vec<AggregateRow>,
    pub excluded_lines: usize,
}
