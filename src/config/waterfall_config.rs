// ==========================================
// 门店订货预测系统 - 瀑布运行参数
// ==========================================
// 职责: 各阶段阈值/系数的显式配置,贯穿整条流水线
// 加载: JSON (缺省字段取生产默认值)
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// ==========================================
// ConfigError - 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置值非法 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// 基线参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// EMA 权重,最近周在前
    pub ema_weights: [f64; 4],
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            ema_weights: [0.6, 0.2, 0.1, 0.1],
        }
    }
}

// ==========================================
// 下滑/高损耗参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub decline_enabled: bool,
    pub decline_threshold: f64, // 相对下滑率阈值: 15%
    pub high_shrink_enabled: bool,
    pub high_shrink_threshold: f64,        // 周损耗阈值: 15%
    pub high_shrink_lookback_weeks: usize, // 连续周数: 2
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            decline_enabled: true,
            decline_threshold: 0.15,
            high_shrink_enabled: true,
            high_shrink_threshold: 0.15,
            high_shrink_lookback_weeks: 2,
        }
    }
}

// ==========================================
// 覆盖参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub base_cover: f64,      // 取整前基础覆盖: 5%
    pub sold_out_cover: f64,  // 上周售罄追加覆盖: 6%
    /// 上周零损耗的行,覆盖不超过 基线 × (1 + sold_out_cover)
    pub guardrail_enabled: bool,
    /// 区域覆盖率覆写,按配置顺序首个命中生效
    pub region_overrides: Vec<RegionCoverOverride>,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            base_cover: 0.05,
            sold_out_cover: 0.06,
            guardrail_enabled: true,
            region_overrides: vec![RegionCoverOverride {
                region_code: "NE".to_string(),
                base_cover: 0.07,
                sold_out_cover: None,
                start_date: None,
                end_date: None,
            }],
        }
    }
}

impl CoverConfig {
    /// 某区域某日生效的覆盖率
    pub fn rates_for(&self, region_code: &str, date: NaiveDate) -> CoverRates {
        self.region_overrides
            .iter()
            .find(|o| o.matches(region_code, date))
            .map(|o| CoverRates {
                base_cover: o.base_cover,
                sold_out_cover: o.sold_out_cover.unwrap_or(self.sold_out_cover),
            })
            .unwrap_or(CoverRates {
                base_cover: self.base_cover,
                sold_out_cover: self.sold_out_cover,
            })
    }
}

/// 区域覆盖率覆写 (日期窗口两端包含,缺省为不限)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCoverOverride {
    pub region_code: String,
    pub base_cover: f64,
    /// 缺省沿用全局 sold_out_cover
    #[serde(default)]
    pub sold_out_cover: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RegionCoverOverride {
    pub fn matches(&self, region_code: &str, date: NaiveDate) -> bool {
        self.region_code == region_code
            && self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverRates {
    pub base_cover: f64,
    pub sold_out_cover: f64,
}

// ==========================================
// 取整参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingConfig {
    /// 余数超过 箱规 × 该比例 时向上取整
    pub round_up_fraction: f64,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            round_up_fraction: 0.5,
        }
    }
}

// ==========================================
// 安全库存参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyStockConfig {
    pub k_factor: f64,
}

impl Default for SafetyStockConfig {
    fn default() -> Self {
        Self { k_factor: 0.25 }
    }
}

// ==========================================
// 门店级调整参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePassConfig {
    pub enabled: bool,
    pub shrink_threshold: f64,
    pub shrink_persistence_weeks: usize,
    pub min_coverage: f64,
    pub max_coverage_for_bump: f64,
    /// 门店总量上限 = 近四周最高周销量 × (1 + 该比例)
    pub historical_threshold: f64,
    /// 损耗控制优先削减超过自身四周最高销量的行
    pub item_historical_cap_enabled: bool,
    pub max_iterations: usize,
}

impl Default for StorePassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shrink_threshold: 0.15,
            shrink_persistence_weeks: 2,
            min_coverage: 0.0,
            max_coverage_for_bump: 0.20,
            historical_threshold: 0.10,
            item_historical_cap_enabled: true,
            max_iterations: 200,
        }
    }
}

// ==========================================
// 天气参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub severity_threshold: f64, // 低于该值不调整: 4.0
    pub max_reduction_pct: f64,  // 门店减量上限: 40%
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity_threshold: 4.0,
            max_reduction_pct: 0.40,
        }
    }
}

// ==========================================
// WaterfallConfig - 总配置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterfallConfig {
    pub baseline: BaselineConfig,
    pub trend: TrendConfig,
    pub cover: CoverConfig,
    pub rounding: RoundingConfig,
    pub safety_stock: SafetyStockConfig,
    pub store_pass: StorePassConfig,
    pub weather: WeatherConfig,
    /// 停业门店 (全部数量清零)
    pub inactive_stores: BTreeSet<String>,
}

impl WaterfallConfig {
    /// 从 JSON 加载并校验
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: WaterfallConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_inactive_store(&self, store_no: &str) -> bool {
        self.inactive_stores.contains(store_no)
    }

    /// 校验参数取值范围
    pub fn validate(&self) -> ConfigResult<()> {
        let weights = &self.baseline.ema_weights;
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(invalid("baseline.ema_weights", weights, "权重必须为非负有限数"));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(invalid("baseline.ema_weights", weights, "权重之和必须大于 0"));
        }

        check_ratio("trend.decline_threshold", self.trend.decline_threshold)?;
        check_ratio("trend.high_shrink_threshold", self.trend.high_shrink_threshold)?;
        if !(1..=4).contains(&self.trend.high_shrink_lookback_weeks) {
            return Err(invalid(
                "trend.high_shrink_lookback_weeks",
                &self.trend.high_shrink_lookback_weeks,
                "必须在 [1, 4] 内",
            ));
        }

        check_non_negative("cover.base_cover", self.cover.base_cover)?;
        check_non_negative("cover.sold_out_cover", self.cover.sold_out_cover)?;
        for (i, o) in self.cover.region_overrides.iter().enumerate() {
            let key = format!("cover.region_overrides[{}]", i);
            if o.region_code.trim().is_empty() {
                return Err(invalid(&key, &o.region_code, "区域代码不能为空"));
            }
            check_non_negative(&key, o.base_cover)?;
            if let Some(rate) = o.sold_out_cover {
                check_non_negative(&key, rate)?;
            }
            if let (Some(start), Some(end)) = (o.start_date, o.end_date) {
                if start > end {
                    return Err(invalid(&key, &(start, end), "开始日期晚于结束日期"));
                }
            }
        }

        let f = self.rounding.round_up_fraction;
        if !f.is_finite() || !(0.0..1.0).contains(&f) {
            return Err(invalid("rounding.round_up_fraction", &f, "必须在 [0, 1) 内"));
        }

        check_non_negative("safety_stock.k_factor", self.safety_stock.k_factor)?;

        check_ratio("store_pass.shrink_threshold", self.store_pass.shrink_threshold)?;
        if !(1..=4).contains(&self.store_pass.shrink_persistence_weeks) {
            return Err(invalid(
                "store_pass.shrink_persistence_weeks",
                &self.store_pass.shrink_persistence_weeks,
                "必须在 [1, 4] 内",
            ));
        }
        if !self.store_pass.min_coverage.is_finite() {
            return Err(invalid(
                "store_pass.min_coverage",
                &self.store_pass.min_coverage,
                "必须为有限数",
            ));
        }
        check_non_negative(
            "store_pass.max_coverage_for_bump",
            self.store_pass.max_coverage_for_bump,
        )?;
        check_non_negative(
            "store_pass.historical_threshold",
            self.store_pass.historical_threshold,
        )?;

        let t = self.weather.severity_threshold;
        if !t.is_finite() || !(0.0..=10.0).contains(&t) {
            return Err(invalid("weather.severity_threshold", &t, "必须在 [0, 10] 内"));
        }
        check_ratio("weather.max_reduction_pct", self.weather.max_reduction_pct)?;

        Ok(())
    }
}

fn invalid(key: &str, value: &impl std::fmt::Debug, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: format!("{:?}", value),
        message: message.to_string(),
    }
}

fn check_ratio(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(key, &value, "必须在 [0, 1] 内"))
    }
}

fn check_non_negative(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(key, &value, "必须为非负有限数"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = WaterfallConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.baseline.ema_weights, [0.6, 0.2, 0.1, 0.1]);
        assert_eq!(config.weather.max_reduction_pct, 0.40);
        assert_eq!(config.store_pass.max_iterations, 200);
        assert_eq!(config.store_pass.historical_threshold, 0.10);
        assert!(config.cover.guardrail_enabled);
        let date = NaiveDate::from_ymd_opt(2026, 7, 3).unwrap();
        assert_eq!(config.cover.rates_for("NE", date).base_cover, 0.07);
        assert_eq!(config.cover.rates_for("BA", date).base_cover, 0.05);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WaterfallConfig::from_json_str(
            r#"{ "weather": { "severity_threshold": 5.0 }, "inactive_stores": ["207"] }"#,
        )
        .unwrap();

        assert_eq!(config.weather.severity_threshold, 5.0);
        assert_eq!(config.weather.max_reduction_pct, 0.40);
        assert!(config.is_inactive_store("207"));
        assert_eq!(config.safety_stock.k_factor, 0.25);
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let err = WaterfallConfig::from_json_str(r#"{ "weather": { "max_reduction_pct": 1.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "weather.max_reduction_pct"));
    }

    #[test]
    fn test_region_override_resolves_inside_window() {
        let config = WaterfallConfig::from_json_str(
            r#"{ "cover": { "region_overrides": [
                { "region_code": "BA", "base_cover": 0.035, "sold_out_cover": 0.035,
                  "start_date": "2026-11-13", "end_date": "2026-11-16" },
                { "region_code": "NE", "base_cover": 0.07 }
            ] } }"#,
        )
        .unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2026, 11, d).unwrap();

        let inside = config.cover.rates_for("BA", day(16));
        assert_eq!(inside.base_cover, 0.035);
        assert_eq!(inside.sold_out_cover, 0.035);

        let outside = config.cover.rates_for("BA", day(17));
        assert_eq!(outside.base_cover, 0.05);
        assert_eq!(outside.sold_out_cover, 0.06);

        // 未给出售罄覆盖时沿用全局值
        let ne = config.cover.rates_for("NE", day(1));
        assert_eq!(ne.base_cover, 0.07);
        assert_eq!(ne.sold_out_cover, 0.06);
    }

    #[test]
    fn test_reversed_override_window_is_rejected() {
        let err = WaterfallConfig::from_json_str(
            r#"{ "cover": { "region_overrides": [
                { "region_code": "LA", "base_cover": 0.04,
                  "start_date": "2026-11-19", "end_date": "2026-11-17" }
            ] } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "cover.region_overrides[0]"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            WaterfallConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
