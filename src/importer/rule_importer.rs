// ==========================================
// 门店订货预测系统 - 调整规则导入器
// ==========================================
// 职责: 原始规则记录 → 校验 → 规则库
// 红线: 单条规则非法只剔除该条,其余规则照常加载
// ==========================================

use crate::domain::adjustment::{AdjustmentRegistry, AdjustmentRule, RawAdjustmentRule};
use crate::domain::types::AdjustmentType;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

// ==========================================
// RuleViolation - 规则校验违规记录
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RuleViolation {
    pub index: usize,
    pub rule_name: Option<String>,
    pub error: ImportError,
}

/// 违规记录的可序列化摘要 (对外报告)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleViolationSummary {
    pub index: usize,
    pub rule_name: Option<String>,
    pub message: String,
}

impl From<&RuleViolation> for RuleViolationSummary {
    fn from(v: &RuleViolation) -> Self {
        Self {
            index: v.index,
            rule_name: v.rule_name.clone(),
            message: v.error.to_string(),
        }
    }
}

// ==========================================
// RuleImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone)]
pub struct RuleImportReport {
    pub registry: AdjustmentRegistry,
    pub violations: Vec<RuleViolation>,
}

impl RuleImportReport {
    pub fn accepted(&self) -> usize {
        self.registry.len()
    }

    pub fn violation_summaries(&self) -> Vec<RuleViolationSummary> {
        self.violations.iter().map(RuleViolationSummary::from).collect()
    }
}

// ==========================================
// RuleImporter - 规则导入器
// ==========================================
pub struct RuleImporter {}

impl RuleImporter {
    pub fn new() -> Self {
        Self {}
    }

    /// 校验并构建规则库 (保持原始顺序)
    pub fn import(&self, raw_rules: Vec<RawAdjustmentRule>) -> RuleImportReport {
        let total = raw_rules.len();
        let mut rules = Vec::with_capacity(total);
        let mut violations = Vec::new();

        for (index, raw) in raw_rules.into_iter().enumerate() {
            let rule_name = raw.name.clone();
            match self.validate(index, raw) {
                Ok(rule) => rules.push(rule),
                Err(error) => {
                    warn!(index, rule_name = ?rule_name, error = %error, "调整规则校验失败,已剔除");
                    violations.push(RuleViolation {
                        index,
                        rule_name,
                        error,
                    });
                }
            }
        }

        info!(
            total,
            accepted = rules.len(),
            rejected = violations.len(),
            "调整规则导入完成"
        );

        RuleImportReport {
            registry: AdjustmentRegistry::new(rules),
            violations,
        }
    }

    /// 单条规则校验
    ///
    /// # 参数
    /// - `index`: 规则在原始列表中的位置 (用于定位)
    /// - `raw`: 原始记录
    pub fn validate(&self, index: usize, raw: RawAdjustmentRule) -> ImportResult<AdjustmentRule> {
        let type_text = raw
            .adjustment_type
            .ok_or(ImportError::MissingField { index, field: "type" })?;
        let adjustment_type: AdjustmentType =
            type_text
                .parse()
                .map_err(|_| ImportError::UnknownAdjustmentType {
                    index,
                    value: type_text.clone(),
                })?;

        let name = raw
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(ImportError::MissingField { index, field: "name" })?;

        let start_date = raw.start_date.ok_or(ImportError::MissingField {
            index,
            field: "start_date",
        })?;
        let end_date = raw.end_date.ok_or(ImportError::MissingField {
            index,
            field: "end_date",
        })?;
        if start_date > end_date {
            return Err(ImportError::InvalidDateRange {
                index,
                start: start_date,
                end: end_date,
            });
        }

        let multiplier = raw.multiplier.ok_or(ImportError::MissingField {
            index,
            field: "multiplier",
        })?;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ImportError::InvalidMultiplier {
                index,
                value: multiplier,
            });
        }

        Ok(AdjustmentRule {
            adjustment_type,
            name,
            regions: to_filter(index, "regions", raw.regions)?,
            stores: to_filter(index, "stores", raw.stores)?,
            items: to_filter(index, "items", raw.items)?,
            start_date,
            end_date,
            multiplier,
        })
    }
}

impl Default for RuleImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_filter(
    index: usize,
    field: &'static str,
    values: Option<Vec<String>>,
) -> ImportResult<Option<BTreeSet<String>>> {
    match values {
        None => Ok(None),
        Some(list) => {
            let set: BTreeSet<String> = list
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if set.is_empty() {
                Err(ImportError::EmptyFilter { index, field })
            } else {
                Ok(Some(set))
            }
        }
    }
}
