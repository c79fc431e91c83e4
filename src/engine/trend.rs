// ==========================================
// 门店订货预测系统 - 趋势调整器
// ==========================================
// 职责: 销量持续下滑补回 (decline_adj) + 持续高损耗下调 (high_shrink_adj)
// 输入: ForecastLine (规则调整之后)
// 输出: 触发时各记录一个瀑布阶段
// ==========================================

use crate::config::waterfall_config::TrendConfig;
use crate::domain::forecast_line::ForecastLine;
use crate::domain::types::StageKind;
use tracing::debug;

pub struct TrendAdjuster {
    config: TrendConfig,
}

impl TrendAdjuster {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// 依次执行下滑与高损耗判定
    pub fn apply(&self, line: &mut ForecastLine) {
        if self.config.decline_enabled {
            if let Some(delta) = self.decline_delta(line) {
                line.apply_stage(StageKind::Decline, StageKind::Decline.label(), delta);
                debug!(store_no = %line.store_no, item_no = %line.item_no, delta, "销量下滑补回");
            }
        }

        if self.config.high_shrink_enabled {
            if let Some(delta) = self.high_shrink_delta(line) {
                line.apply_stage(StageKind::HighShrink, StageKind::HighShrink.label(), delta);
                debug!(store_no = %line.store_no, item_no = %line.item_no, delta, "高损耗下调");
            }
        }
    }

    // ==========================================
    // 下滑判定
    // ==========================================

    /// 下滑补回量; 未触发返回 None
    ///
    /// 条件: 四周销量单调不增、末周严格低于首周、相对下滑率 >= 阈值
    pub fn decline_delta(&self, line: &ForecastLine) -> Option<f64> {
        let [w1, w2, w3, w4] = line.history.sold;
        if !(w4 >= w3 && w3 >= w2 && w2 >= w1 && w4 > w1) {
            return None;
        }

        let average = line.baseline.average_sold;
        if average <= 0.0 {
            return None;
        }
        let decline_rate = -line.baseline.velocity / average;
        if decline_rate < self.config.decline_threshold {
            return None;
        }

        // 以较早几周的销量水平为恢复目标
        let recovery = 0.5 * w2 + 0.4 * w3 + 0.1 * w4;
        let delta = recovery - line.quantity;
        (delta > 0.0).then_some(delta)
    }

    // ==========================================
    // 高损耗判定
    // ==========================================

    /// 高损耗下调量 (负值); 未触发返回 None
    ///
    /// 最近 N 个有出货的周损耗率均 >= 阈值时,按超出部分比例下调,
    /// 且不低于一箱
    pub fn high_shrink_delta(&self, line: &ForecastLine) -> Option<f64> {
        let lookback = self.config.high_shrink_lookback_weeks;
        let threshold = self.config.high_shrink_threshold;

        let recent: Vec<f64> = (0..4)
            .filter_map(|w| line.history.weekly_shrink(w))
            .take(lookback)
            .collect();
        if recent.len() < lookback || recent.iter().any(|s| *s < threshold) {
            return None;
        }

        let one_case = f64::from(line.case_pack);
        if line.quantity <= one_case {
            return None;
        }

        let mean_shrink = recent.iter().sum::<f64>() / recent.len() as f64;
        let delta = (-line.quantity * (mean_shrink - threshold)).max(one_case - line.quantity);
        (delta < 0.0).then_some(delta)
    }
}

impl Default for TrendAdjuster {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}
