// ==========================================
// 门店订货预测系统 - 瀑布流水线
// ==========================================
// 职责: 串联各阶段,输出逐行瀑布结果
// 流程:
//   阶段一 (逐行并行):
//     基线 → 规则调整 → 下滑/高损耗 → 基础覆盖 → 取整 → 安全库存/售罄覆盖
//     → 有效覆盖封顶 → 停业门店
//   同步点: 按 (门店, 日期) 分组
//   阶段二 (分组并行):
//     门店级调整 → 天气减量
// ==========================================
// 红线: 输出顺序与输入顺序一致
// 红线: 单行错误只剔除该行,整批继续
// ==========================================

use crate::config::waterfall_config::WaterfallConfig;
use crate::domain::adjustment::AdjustmentRegistry;
use crate::domain::aggregate::{AggregateLevel, AggregationReport};
use crate::domain::forecast_line::{ForecastLine, ForecastLineInput, WaterfallRecord};
use crate::domain::types::StageKind;
use crate::domain::weather::WeatherObservation;
use crate::engine::adjustment::AdjustmentEngine;
use crate::engine::aggregator::WaterfallAggregator;
use crate::engine::baseline::BaselineSelector;
use crate::engine::error::EngineError;
use crate::engine::rounding::RoundingEngine;
use crate::engine::safety_stock::SafetyStockCalculator;
use crate::engine::store_pass::StorePassAdjuster;
use crate::engine::trend::TrendAdjuster;
use crate::engine::weather_adjuster::WeatherAdjuster;
use crate::engine::weather_severity::WeatherSeverityScorer;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument, warn};
use uuid::Uuid;

type StoreDayKey = (String, NaiveDate);

// ==========================================
// 批次结果
// ==========================================

/// 被剔除的输入行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineFailure {
    pub index: usize,
    pub error: EngineError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallBatchResult {
    pub run_id: Uuid,
    pub lines: Vec<ForecastLine>,
    pub errors: Vec<LineFailure>,
}

impl WaterfallBatchResult {
    pub fn records(&self) -> Vec<WaterfallRecord> {
        self.lines.iter().map(ForecastLine::waterfall).collect()
    }

    pub fn excluded_lines(&self) -> usize {
        self.errors.len()
    }

    pub fn aggregate(&self, level: AggregateLevel) -> AggregationReport {
        WaterfallAggregator::new().report(&self.lines, level, self.excluded_lines())
    }
}

// ==========================================
// WaterfallPipeline - 瀑布流水线
// ==========================================
pub struct WaterfallPipeline {
    config: WaterfallConfig,
    baseline: BaselineSelector,
    adjustment: AdjustmentEngine,
    trend: TrendAdjuster,
    rounding: RoundingEngine,
    safety: SafetyStockCalculator,
    store_pass: StorePassAdjuster,
    scorer: WeatherSeverityScorer,
    weather: WeatherAdjuster,
}

impl WaterfallPipeline {
    pub fn new(config: WaterfallConfig) -> Self {
        Self {
            baseline: BaselineSelector::new(config.baseline.clone()),
            adjustment: AdjustmentEngine::new(),
            trend: TrendAdjuster::new(config.trend.clone()),
            rounding: RoundingEngine::new(config.rounding.clone()),
            safety: SafetyStockCalculator::new(config.safety_stock.clone(), config.cover.clone()),
            store_pass: StorePassAdjuster::new(config.store_pass.clone()),
            scorer: WeatherSeverityScorer::new(),
            weather: WeatherAdjuster::new(config.weather.clone()),
            config,
        }
    }

    pub fn config(&self) -> &WaterfallConfig {
        &self.config
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行整批瀑布计算
    ///
    /// # 参数
    /// - `inputs`: 预测行输入 (输出保持该顺序)
    /// - `registry`: 已校验的规则库
    /// - `observations`: 门店日天气观测,缺失视为无天气影响
    #[instrument(skip_all, fields(lines = inputs.len(), rules = registry.len()))]
    pub fn run(
        &self,
        inputs: Vec<ForecastLineInput>,
        registry: &AdjustmentRegistry,
        observations: &[WeatherObservation],
    ) -> WaterfallBatchResult {
        let run_id = Uuid::new_v4();
        let total = inputs.len();

        // ===== 阶段一: 逐行 =====
        let prepared: Vec<Result<(usize, ForecastLine), LineFailure>> = inputs
            .into_par_iter()
            .enumerate()
            .map(|(index, input)| match ForecastLine::from_input(input) {
                Ok(mut line) => {
                    self.process_line(&mut line, registry);
                    Ok((index, line))
                }
                Err(error) => Err(LineFailure {
                    index,
                    error: error.into(),
                }),
            })
            .collect();

        let mut groups: BTreeMap<StoreDayKey, Vec<(usize, ForecastLine)>> = BTreeMap::new();
        let mut errors = Vec::new();
        for item in prepared {
            match item {
                Ok((index, line)) => groups.entry(line.store_key()).or_default().push((index, line)),
                Err(failure) => {
                    warn!(index = failure.index, error = %failure.error, "预测行已剔除");
                    errors.push(failure);
                }
            }
        }

        // ===== 阶段二: 门店分组 =====
        let weather_index = index_observations(observations);
        let mut lines: Vec<(usize, ForecastLine)> = groups
            .into_par_iter()
            .flat_map_iter(|(key, members)| {
                let observation = weather_index.get(&key).copied();
                self.process_store_day(members, observation)
            })
            .collect();
        lines.sort_by_key(|(index, _)| *index);

        let lines: Vec<ForecastLine> = lines.into_iter().map(|(_, line)| line).collect();
        let anomalies = lines.iter().filter(|l| l.anomaly).count();
        info!(
            run_id = %run_id,
            total,
            processed = lines.len(),
            excluded = errors.len(),
            anomalies,
            "瀑布计算完成"
        );

        WaterfallBatchResult {
            run_id,
            lines,
            errors,
        }
    }

    /// 单行阶段 (不依赖其他行)
    pub fn process_line(&self, line: &mut ForecastLine, registry: &AdjustmentRegistry) {
        let as_of_date = line.date_forecast;
        self.baseline.apply(line);
        self.adjustment.apply(line, registry, as_of_date);
        self.trend.apply(line);
        self.safety.apply_base_cover(line);
        let rounding_delta = self.rounding.apply(line);
        self.safety.apply(line, rounding_delta);
        self.safety.apply_cover_guardrail(line);

        if self.config.is_inactive_store(&line.store_no) && line.quantity > 0.0 {
            let delta = -line.quantity;
            line.apply_stage(StageKind::InactiveStore, StageKind::InactiveStore.label(), delta);
        }
    }

    /// 门店日阶段: 门店级调整 → 天气减量
    pub fn process_store_day(
        &self,
        members: Vec<(usize, ForecastLine)>,
        observation: Option<&WeatherObservation>,
    ) -> Vec<(usize, ForecastLine)> {
        let (indices, mut group): (Vec<usize>, Vec<ForecastLine>) = members.into_iter().unzip();

        self.store_pass.apply(&mut group);
        let severity = self.scorer.score(observation);
        self.weather.apply(&mut group, &severity);

        indices.into_iter().zip(group).collect()
    }
}

impl Default for WaterfallPipeline {
    fn default() -> Self {
        Self::new(WaterfallConfig::default())
    }
}

/// 同一门店日多条观测时取第一条
fn index_observations(observations: &[WeatherObservation]) -> HashMap<StoreDayKey, &WeatherObservation> {
    let mut index = HashMap::with_capacity(observations.len());
    for obs in observations {
        index.entry(obs.key()).or_insert(obs);
    }
    index
}
