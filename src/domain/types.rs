// ==========================================
// 门店订货预测系统 - 领域类型定义
// ==========================================
// 红线: 调整类型为封闭枚举,引擎按类型分支时必须穷举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 调整类型 (Adjustment Type)
// ==========================================
// 声明顺序即规范执行顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    Promo,           // 促销
    HolidayIncrease, // 节假日上调
    Cannibalism,     // 竞品/同店蚕食
    AdhocIncrease,   // 临时上调
    AdhocDecrease,   // 临时下调
    StoreSpecific,   // 门店专项
    ItemSpecific,    // 单品专项
    Regional,        // 区域专项
}

impl AdjustmentType {
    /// 规范执行顺序
    pub const ALL: [AdjustmentType; 8] = [
        AdjustmentType::Promo,
        AdjustmentType::HolidayIncrease,
        AdjustmentType::Cannibalism,
        AdjustmentType::AdhocIncrease,
        AdjustmentType::AdhocDecrease,
        AdjustmentType::StoreSpecific,
        AdjustmentType::ItemSpecific,
        AdjustmentType::Regional,
    ];

    /// 在 ALL 中的下标 (用于按类型索引的定长存储)
    pub fn index(self) -> usize {
        match self {
            AdjustmentType::Promo => 0,
            AdjustmentType::HolidayIncrease => 1,
            AdjustmentType::Cannibalism => 2,
            AdjustmentType::AdhocIncrease => 3,
            AdjustmentType::AdhocDecrease => 4,
            AdjustmentType::StoreSpecific => 5,
            AdjustmentType::ItemSpecific => 6,
            AdjustmentType::Regional => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentType::Promo => "PROMO",
            AdjustmentType::HolidayIncrease => "HOLIDAY_INCREASE",
            AdjustmentType::Cannibalism => "CANNIBALISM",
            AdjustmentType::AdhocIncrease => "ADHOC_INCREASE",
            AdjustmentType::AdhocDecrease => "ADHOC_DECREASE",
            AdjustmentType::StoreSpecific => "STORE_SPECIFIC",
            AdjustmentType::ItemSpecific => "ITEM_SPECIFIC",
            AdjustmentType::Regional => "REGIONAL",
        }
    }
}

impl fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdjustmentType {
    type Err = String;

    /// 大小写不敏感,允许 '-' 与空格代替 '_'
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        AdjustmentType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("未知调整类型: {}", s))
    }
}

// ==========================================
// 基线来源 (Baseline Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    LwSales,     // 上周销量
    Ema,         // 加权平均
    Average,     // 非零周出货均值
    MinimumCase, // 最小一箱
}

impl fmt::Display for BaselineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineSource::LwSales => write!(f, "lw_sales"),
            BaselineSource::Ema => write!(f, "ema"),
            BaselineSource::Average => write!(f, "average"),
            BaselineSource::MinimumCase => write!(f, "minimum_case"),
        }
    }
}

// ==========================================
// 取整方向 (Rounding Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingDirection {
    Up,
    Down,
    #[default]
    None,
}

impl fmt::Display for RoundingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingDirection::Up => write!(f, "up"),
            RoundingDirection::Down => write!(f, "down"),
            RoundingDirection::None => write!(f, "none"),
        }
    }
}

// ==========================================
// 瀑布阶段类型 (Stage Kind)
// ==========================================
// 用于聚合: 规则调整阶段的名称是规则名,聚合按阶段类型归并
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    EmaUplift,
    Adjustment,
    Decline,
    HighShrink,
    BaseCover,
    Rounding,
    SafetyStock,
    CoverSoldOut,
    CoverGuardrail,
    InactiveStore,
    StorePass,
    Weather,
}

impl StageKind {
    /// 固定阶段名 (Adjustment 阶段使用规则名,此处仅为兜底)
    pub fn label(self) -> &'static str {
        match self {
            StageKind::EmaUplift => "ema_uplift",
            StageKind::Adjustment => "adjustment",
            StageKind::Decline => "decline_adj",
            StageKind::HighShrink => "high_shrink_adj",
            StageKind::BaseCover => "base_cover",
            StageKind::Rounding => "rnd_net",
            StageKind::SafetyStock => "safety_stock",
            StageKind::CoverSoldOut => "cover_so",
            StageKind::CoverGuardrail => "cover_guardrail",
            StageKind::InactiveStore => "inactive_store",
            StageKind::StorePass => "store_pass",
            StageKind::Weather => "weather",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 门店级调整原因 (Store Pass Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePassReason {
    #[default]
    None,
    CoverageAdd,   // 覆盖不足,补箱
    ShrinkControl, // 损耗持续偏高,减箱
}

impl fmt::Display for StorePassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorePassReason::None => write!(f, "none"),
            StorePassReason::CoverageAdd => write!(f, "coverage_add"),
            StorePassReason::ShrinkControl => write!(f, "shrink_control"),
        }
    }
}

// ==========================================
// 天气严重度等级 (Severity Category)
// ==========================================
// 顺序: Minimal < Low < Moderate < High < Severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityCategory {
    #[default]
    Minimal,
    Low,
    Moderate,
    High,
    Severe,
}

impl SeverityCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            SeverityCategory::Severe
        } else if score >= 5.0 {
            SeverityCategory::High
        } else if score >= 3.0 {
            SeverityCategory::Moderate
        } else if score >= 1.5 {
            SeverityCategory::Low
        } else {
            SeverityCategory::Minimal
        }
    }
}

impl fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityCategory::Minimal => write!(f, "MINIMAL"),
            SeverityCategory::Low => write!(f, "LOW"),
            SeverityCategory::Moderate => write!(f, "MODERATE"),
            SeverityCategory::High => write!(f, "HIGH"),
            SeverityCategory::Severe => write!(f, "SEVERE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_type_order_matches_index() {
        for (i, t) in AdjustmentType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i);
        }
    }

    #[test]
    fn test_adjustment_type_from_str() {
        assert_eq!("promo".parse::<AdjustmentType>(), Ok(AdjustmentType::Promo));
        assert_eq!(
            "holiday-increase".parse::<AdjustmentType>(),
            Ok(AdjustmentType::HolidayIncrease)
        );
        assert!("WEATHER".parse::<AdjustmentType>().is_err());
    }

    #[test]
    fn test_severity_category_boundaries() {
        assert_eq!(SeverityCategory::from_score(0.0), SeverityCategory::Minimal);
        assert_eq!(SeverityCategory::from_score(1.5), SeverityCategory::Low);
        assert_eq!(SeverityCategory::from_score(3.0), SeverityCategory::Moderate);
        assert_eq!(SeverityCategory::from_score(5.0), SeverityCategory::High);
        assert_eq!(SeverityCategory::from_score(7.0), SeverityCategory::Severe);
    }
}
