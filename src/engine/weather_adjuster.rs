// ==========================================
// 门店订货预测系统 - 天气减量调整器
// ==========================================
// 职责: 严重度 → 销售影响系数 → 门店内按比例整箱减量
// 输入: 同一 (门店, 日期) 的预测行 + 该门店天气严重度
// 输出: 每行一个 weather 阶段 (不触发为 0)
// ==========================================
// 红线: 门店减量合计不超过减量前合计的上限比例 (默认 40%)
// 红线: 有数量的单品至少保留一箱
// ==========================================

use crate::config::waterfall_config::WeatherConfig;
use crate::domain::forecast_line::{ForecastLine, QTY_EPSILON};
use crate::domain::types::StageKind;
use crate::domain::weather::WeatherSeverity;
use tracing::info;

/// 单个门店分组的天气调整结果
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherOutcome {
    pub applied: bool,
    pub reduction_pct: f64,
    pub pre_weather_total: f64,
    pub reduced_qty: f64,
}

pub struct WeatherAdjuster {
    config: WeatherConfig,
}

impl WeatherAdjuster {
    pub fn new(config: WeatherConfig) -> Self {
        Self { config }
    }

    // ==========================================
    // 系数换算
    // ==========================================

    /// 严重度 → 销售影响系数 (分段线性)
    ///
    /// 端点: 2→1.00, 4→0.95, 6→0.85, 8→0.70, 10→0.50
    pub fn impact_factor(&self, score: f64) -> f64 {
        let s = score.clamp(0.0, 10.0);
        if s <= 2.0 {
            1.0
        } else if s <= 4.0 {
            1.0 - (s - 2.0) * 0.025
        } else if s <= 6.0 {
            0.95 - (s - 4.0) * 0.05
        } else if s <= 8.0 {
            0.85 - (s - 6.0) * 0.075
        } else {
            0.70 - (s - 8.0) * 0.10
        }
    }

    /// 门店减量比例 (已受上限约束); 低于阈值为 0
    pub fn reduction_pct(&self, score: f64) -> f64 {
        if !self.config.enabled || score < self.config.severity_threshold {
            return 0.0;
        }
        (1.0 - self.impact_factor(score)).clamp(0.0, self.config.max_reduction_pct)
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 对一个 (门店, 日期) 分组应用天气减量
    pub fn apply(&self, group: &mut [ForecastLine], severity: &WeatherSeverity) -> WeatherOutcome {
        let pre_weather_total: f64 = group.iter().map(|l| l.quantity).sum();
        let pct = self.reduction_pct(severity.score);
        let applied = pct > 0.0;

        let mut removals = vec![0.0; group.len()];
        if applied {
            for (i, line) in group.iter().enumerate() {
                let case = f64::from(line.case_pack);
                if line.quantity <= 0.0 {
                    continue;
                }
                let held_cases = (line.quantity / case + QTY_EPSILON).floor();
                let wanted = (line.quantity * pct / case + QTY_EPSILON).floor();
                let cases = wanted.min((held_cases - 1.0).max(0.0));
                removals[i] = cases * case;
            }

            let cap = pre_weather_total * self.config.max_reduction_pct;
            if removals.iter().all(|r| *r <= 0.0) && severity.score > self.config.severity_threshold {
                if let Some(i) = guarantee_candidate(group) {
                    let case = f64::from(group[i].case_pack);
                    if case <= cap + QTY_EPSILON {
                        removals[i] = case;
                    }
                }
            }
        }

        let reason = if applied {
            format!("{} (severity {:.2}, {})", severity.driver, severity.score, severity.category)
        } else {
            String::new()
        };

        let mut reduced_qty = 0.0;
        for (i, line) in group.iter_mut().enumerate() {
            line.pre_weather_qty = line.quantity;
            let delta = line.apply_stage(StageKind::Weather, StageKind::Weather.label(), -removals[i]);
            line.weather_severity = severity.score;
            line.weather_category = severity.category;
            line.weather_applied = applied;
            line.weather_reason = reason.clone();
            line.weather_adjustment_qty = delta;
            reduced_qty -= delta;
        }

        if applied {
            if let Some(first) = group.first() {
                info!(
                    store_no = %first.store_no,
                    date = %first.date_forecast,
                    severity = severity.score,
                    reduction_pct = pct,
                    reduced_qty,
                    pre_weather_total,
                    "天气减量完成"
                );
            }
        }

        WeatherOutcome {
            applied,
            reduction_pct: pct,
            pre_weather_total,
            reduced_qty,
        }
    }
}

impl Default for WeatherAdjuster {
    fn default() -> Self {
        Self::new(WeatherConfig::default())
    }
}

/// 保底减量候选: 至少两箱,非主推品优先,覆盖率高者优先
fn guarantee_candidate(group: &[ForecastLine]) -> Option<usize> {
    group
        .iter()
        .enumerate()
        .filter(|(_, l)| l.quantity + QTY_EPSILON >= 2.0 * f64::from(l.case_pack))
        .min_by(|(a, la), (b, lb)| {
            la.hero_item
                .cmp(&lb.hero_item)
                .then_with(|| lb.coverage().total_cmp(&la.coverage()))
                .then_with(|| la.item_no.cmp(&lb.item_no))
                .then_with(|| a.cmp(b))
        })
        .map(|(i, _)| i)
}
