// ==========================================
// 门店订货预测系统 - 天气领域模型
// ==========================================
// 职责: 门店日天气观测 + 严重度评分明细
// 单位: 降雨/降雪/积雪 英寸, 风速 mph, 能见度 英里
// ==========================================

use crate::domain::types::SeverityCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// WeatherObservation - 天气观测 (外部数据源提供)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub store_no: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub rain_amount: f64,
    #[serde(default)]
    pub rain_probability: f64, // 0-100
    #[serde(default)]
    pub snow_amount: f64,
    #[serde(default)]
    pub snow_depth: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub visibility: Option<f64>, // None = 无数据,视为良好
    #[serde(default)]
    pub storm_risk: f64, // 0-100
    #[serde(default)]
    pub precip_coverage: Option<f64>, // 0-100, 全天降水覆盖率
    #[serde(default)]
    pub ice: bool,
}

impl WeatherObservation {
    /// 创建空观测 (所有指标为 0)
    pub fn new(store_no: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            store_no: store_no.into(),
            date,
            rain_amount: 0.0,
            rain_probability: 0.0,
            snow_amount: 0.0,
            snow_depth: 0.0,
            wind_speed: 0.0,
            wind_gust: None,
            visibility: None,
            storm_risk: 0.0,
            precip_coverage: None,
            ice: false,
        }
    }

    pub fn key(&self) -> (String, NaiveDate) {
        (self.store_no.clone(), self.date)
    }
}

// ==========================================
// WeatherSeverity - 严重度评分结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeverity {
    pub score: f64, // [0, 10], 两位小数
    pub category: SeverityCategory,
    pub rain_score: f64,
    pub snow_score: f64,
    pub wind_score: f64,
    pub visibility_score: f64,
    pub storm_score: f64,
    pub base_score: f64,
    pub bonus: f64,
    pub driver: String, // 主导因素描述
}

impl WeatherSeverity {
    /// 无观测时的零严重度
    pub fn none() -> Self {
        Self {
            driver: "no observation".to_string(),
            ..Default::default()
        }
    }
}
