// ==========================================
// 门店订货预测系统 - 基线选择器
// ==========================================
// 职责: 从四周历史中选择瀑布起点
// 策略 (顺序判定,命中即返回):
//   1) 上周无出货          → minimum_case (一箱)
//   2) 四周无销量但有出货  → average (非零出货周均值)
//   3) 上周销量 >= EMA     → lw_sales
//   4) 其他                → ema (记录 ema_uplift 阶段)
// ==========================================

use crate::config::waterfall_config::BaselineConfig;
use crate::domain::forecast_line::{BaselineSelection, ForecastLine, SalesHistory};
use crate::domain::types::{BaselineSource, StageKind};

/// 线性回归横坐标: 四周前 → 上周
const WEEK_OFFSETS: [f64; 4] = [-3.0, -2.0, -1.0, 0.0];

pub struct BaselineSelector {
    config: BaselineConfig,
}

impl BaselineSelector {
    pub fn new(config: BaselineConfig) -> Self {
        Self { config }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 选择基线并启动瀑布
    pub fn apply(&self, line: &mut ForecastLine) -> BaselineSource {
        let selection = self.select(&line.history, line.case_pack);
        line.start_waterfall(selection.start_qty);
        if selection.ema_uplift > 0.0 {
            line.apply_stage(
                StageKind::EmaUplift,
                StageKind::EmaUplift.label(),
                selection.ema_uplift,
            );
        }
        let source = selection.source;
        line.baseline = selection;
        source
    }

    /// 纯计算: 历史 + 箱规 → 基线选择
    pub fn select(&self, history: &SalesHistory, case_pack: u32) -> BaselineSelection {
        let ema = self.ema(history);
        let average_sold = average_non_zero(&history.sold);
        let velocity = velocity(history);
        let volatility = volatility(history);
        let lw_sold = history.lw_sold();

        let (source, baseline_qty, start_qty) = if history.lw_shipped() <= 0.0 {
            let one_case = f64::from(case_pack);
            (BaselineSource::MinimumCase, one_case, one_case)
        } else if history.sold.iter().all(|s| *s <= 0.0) {
            let avg = average_non_zero(&history.shipped);
            (BaselineSource::Average, avg, avg)
        } else if lw_sold >= ema {
            (BaselineSource::LwSales, lw_sold, lw_sold)
        } else {
            (BaselineSource::Ema, ema, lw_sold)
        };

        BaselineSelection {
            source,
            baseline_qty,
            start_qty,
            ema_uplift: if source == BaselineSource::Ema {
                ema - lw_sold
            } else {
                0.0
            },
            ema,
            average_sold,
            velocity,
            volatility,
        }
    }

    /// 加权移动平均 (最近周在前)
    pub fn ema(&self, history: &SalesHistory) -> f64 {
        history
            .sold
            .iter()
            .zip(self.config.ema_weights.iter())
            .map(|(s, w)| s * w)
            .sum()
    }
}

impl Default for BaselineSelector {
    fn default() -> Self {
        Self::new(BaselineConfig::default())
    }
}

// ==========================================
// 历史指标
// ==========================================

/// 非零周均值; 全为零返回 0
pub fn average_non_zero(values: &[f64; 4]) -> f64 {
    let non_zero: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if non_zero.is_empty() {
        0.0
    } else {
        non_zero.iter().sum::<f64>() / non_zero.len() as f64
    }
}

/// 销量线性趋势斜率 (件/周),负值表示下滑
pub fn velocity(history: &SalesHistory) -> f64 {
    // 按时间先后排列: 四周前 → 上周
    let ys = [
        history.sold[3],
        history.sold[2],
        history.sold[1],
        history.sold[0],
    ];
    let x_mean = WEEK_OFFSETS.iter().sum::<f64>() / 4.0;
    let y_mean = ys.iter().sum::<f64>() / 4.0;

    let (num, den) = WEEK_OFFSETS
        .iter()
        .zip(ys.iter())
        .fold((0.0, 0.0), |(num, den), (x, y)| {
            let dx = x - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    num / den
}

/// 四周销量总体标准差
pub fn volatility(history: &SalesHistory) -> f64 {
    let mean = history.sold.iter().sum::<f64>() / 4.0;
    let variance = history
        .sold
        .iter()
        .map(|s| (s - mean).powi(2))
        .sum::<f64>()
        / 4.0;
    variance.sqrt()
}
