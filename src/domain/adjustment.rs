// ==========================================
// 门店订货预测系统 - 调整规则领域模型
// ==========================================
// 职责: 调整规则 + 按类型索引的只读规则库
// 红线: 规则库构建后不可变,匹配为纯函数
// ==========================================

use crate::domain::types::AdjustmentType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// RawAdjustmentRule - 外部配置原始记录
// ==========================================
// 所有字段可缺失,由 RuleImporter 校验后转换为 AdjustmentRule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAdjustmentRule {
    #[serde(default, rename = "type")]
    pub adjustment_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default)]
    pub stores: Option<Vec<String>>,
    #[serde(default)]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub multiplier: Option<f64>,
}

// ==========================================
// AdjustmentRule - 已校验的调整规则
// ==========================================
// 过滤维度为 None 表示该维度匹配全部; 多个维度之间为 AND
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    pub adjustment_type: AdjustmentType,
    pub name: String,
    pub regions: Option<BTreeSet<String>>,
    pub stores: Option<BTreeSet<String>>,
    pub items: Option<BTreeSet<String>>,
    pub start_date: NaiveDate, // 含
    pub end_date: NaiveDate,   // 含
    pub multiplier: f64,       // > 0
}

impl AdjustmentRule {
    /// 日期是否落在 [start_date, end_date] 内
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// 区域/门店/单品过滤是否全部命中
    pub fn matches_scope(&self, region: &str, store: &str, item: &str) -> bool {
        filter_contains(&self.regions, region)
            && filter_contains(&self.stores, store)
            && filter_contains(&self.items, item)
    }
}

fn filter_contains(filter: &Option<BTreeSet<String>>, value: &str) -> bool {
    match filter {
        None => true,
        Some(set) => set.contains(value),
    }
}

// ==========================================
// AdjustmentRegistry - 按类型索引的规则库
// ==========================================
// 每个类型内保持配置(插入)顺序
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjustmentRegistry {
    by_type: [Vec<AdjustmentRule>; 8],
}

impl AdjustmentRegistry {
    /// 从已校验规则构建 (保持输入顺序)
    pub fn new(rules: Vec<AdjustmentRule>) -> Self {
        let mut registry = Self::default();
        for rule in rules {
            registry.by_type[rule.adjustment_type.index()].push(rule);
        }
        registry
    }

    /// 指定类型的规则 (配置顺序)
    pub fn rules_of(&self, adjustment_type: AdjustmentType) -> &[AdjustmentRule] {
        &self.by_type[adjustment_type.index()]
    }

    pub fn len(&self) -> usize {
        self.by_type.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
