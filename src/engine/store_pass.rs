// ==========================================
// 门店订货预测系统 - 门店级调整器
// ==========================================
// 职责: 在 (门店, 日期) 分组内整箱增减,平衡覆盖与损耗
// 输入: 同一门店同一日期的全部预测行 (安全库存之后)
// 输出: 每行一个 store_pass 阶段 (未调整为 0)
// ==========================================
// 规则:
//   - 损耗控制: (门店历史损耗连续偏高 且 预测损耗 > 阈值)
//               或 门店总量 > 近四周最高周销量 × (1 + historical_threshold) → 逐箱减量
//   - 覆盖补足: 未做损耗控制 且 门店覆盖 < 目标 → 逐箱加量
//   - 减量顺序: 非主推品 → 超过自身四周最高销量 → 覆盖率升序 → 单品号
//   - 加量顺序: 非主推品 → 覆盖率升序 → 单品号
// 红线: 售罄行不减量; 每行至少保留一箱; 减量后不低于基线
// ==========================================

use crate::config::waterfall_config::StorePassConfig;
use crate::domain::forecast_line::ForecastLine;
use crate::domain::types::{StageKind, StorePassReason};
use std::cmp::Ordering;
use tracing::{debug, info};

/// 单个分组的调整结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorePassOutcome {
    pub reason: StorePassReason,
    pub cases_moved: usize,
    pub qty_delta: f64,
}

pub struct StorePassAdjuster {
    config: StorePassConfig,
}

impl StorePassAdjuster {
    pub fn new(config: StorePassConfig) -> Self {
        Self { config }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 对一个 (门店, 日期) 分组执行门店级调整
    pub fn apply(&self, group: &mut [ForecastLine]) -> StorePassOutcome {
        for line in group.iter_mut() {
            line.pre_store_pass_qty = line.quantity;
            line.store_pass_reason = StorePassReason::None;
        }

        let mut qty: Vec<f64> = group.iter().map(|l| l.quantity).collect();
        let mut touched = vec![false; group.len()];

        let outcome = if !self.config.enabled || group.is_empty() {
            StorePassOutcome {
                reason: StorePassReason::None,
                cases_moved: 0,
                qty_delta: 0.0,
            }
        } else if self.needs_shrink_control(group) {
            self.shrink_control(group, &mut qty, &mut touched)
        } else {
            self.coverage_add(group, &mut qty, &mut touched)
        };

        for (i, line) in group.iter_mut().enumerate() {
            let delta = line.apply_stage(
                StageKind::StorePass,
                StageKind::StorePass.label(),
                qty[i] - line.quantity,
            );
            if touched[i] {
                line.store_pass_reason = outcome.reason;
            }
            if delta > 0.0 {
                line.store_grow_qty = delta;
            } else if delta < 0.0 {
                line.store_decline_qty = -delta;
            }
        }

        if outcome.cases_moved > 0 {
            if let Some(first) = group.first() {
                info!(
                    store_no = %first.store_no,
                    date = %first.date_forecast,
                    reason = %outcome.reason,
                    cases = outcome.cases_moved,
                    qty_delta = outcome.qty_delta,
                    "门店级调整完成"
                );
            }
        }

        outcome
    }

    // ==========================================
    // 损耗控制
    // ==========================================

    /// 是否进入损耗控制: 持续高损耗 或 超过门店历史上限
    pub fn needs_shrink_control(&self, group: &[ForecastLine]) -> bool {
        let qty: Vec<f64> = group.iter().map(|l| l.quantity).collect();
        self.shrink_pressure(group, &qty) || self.exceeds_store_history(group, &qty)
    }

    /// 门店历史损耗连续偏高,且当前预测损耗超阈值
    fn shrink_pressure(&self, group: &[ForecastLine], qty: &[f64]) -> bool {
        let threshold = self.config.shrink_threshold;
        let persistent = (0..self.config.shrink_persistence_weeks).all(|w| {
            store_weekly_shrink(group, w).map_or(false, |s| s >= threshold)
        });
        persistent && projected_shrink(group, qty).map_or(false, |s| s > threshold)
    }

    /// 门店总量是否超过 近四周最高周销量 × (1 + historical_threshold)
    ///
    /// 无销售历史的门店不设上限
    fn exceeds_store_history(&self, group: &[ForecastLine], qty: &[f64]) -> bool {
        let store_max = store_max_weekly_sold(group);
        if store_max <= 0.0 {
            return false;
        }
        qty.iter().sum::<f64>() > store_max * (1.0 + self.config.historical_threshold)
    }

    fn shrink_control(
        &self,
        group: &[ForecastLine],
        qty: &mut [f64],
        touched: &mut [bool],
    ) -> StorePassOutcome {
        let historical_first = self.config.item_historical_cap_enabled;
        let mut cases_moved = 0;
        let mut qty_delta = 0.0;

        for _ in 0..self.config.max_iterations {
            if !self.shrink_pressure(group, qty) && !self.exceeds_store_history(group, qty) {
                break;
            }

            let eligible = |i: usize, line: &ForecastLine| {
                let case = f64::from(line.case_pack);
                !line.sold_out_last_week
                    && qty[i] >= 2.0 * case
                    && qty[i] - case >= line.baseline.baseline_qty
            };
            let candidate = pick_line(group, eligible, |(a, la), (b, lb)| {
                let over = |i: usize, line: &ForecastLine| {
                    historical_first && exceeds_item_history(line, qty[i])
                };
                la.hero_item
                    .cmp(&lb.hero_item)
                    .then_with(|| over(b, lb).cmp(&over(a, la)))
                    .then_with(|| line_coverage(la, qty[a]).total_cmp(&line_coverage(lb, qty[b])))
            });
            let Some(i) = candidate else { break };

            let case = f64::from(group[i].case_pack);
            qty[i] -= case;
            touched[i] = true;
            cases_moved += 1;
            qty_delta -= case;
        }

        debug!(cases_moved, qty_delta, "损耗控制结束");
        StorePassOutcome {
            reason: StorePassReason::ShrinkControl,
            cases_moved,
            qty_delta,
        }
    }

    // ==========================================
    // 覆盖补足
    // ==========================================

    fn coverage_add(
        &self,
        group: &[ForecastLine],
        qty: &mut [f64],
        touched: &mut [bool],
    ) -> StorePassOutcome {
        // 加一箱后覆盖不得超过 1 + max_coverage_for_bump (已超该覆盖的行自然排除)
        let max_line_coverage = 1.0 + self.config.max_coverage_for_bump;
        let historical_cap = self.config.item_historical_cap_enabled;
        let mut cases_moved = 0;
        let mut qty_delta = 0.0;

        for _ in 0..self.config.max_iterations {
            match store_coverage(group, qty) {
                Some(c) if c < self.config.min_coverage => {}
                _ => break,
            }

            let eligible = |i: usize, line: &ForecastLine| {
                let baseline = line.baseline.baseline_qty;
                let bumped = qty[i] + f64::from(line.case_pack);
                baseline > 0.0
                    && qty[i] > 0.0
                    && !line.sold_out_last_week
                    && bumped / baseline <= max_line_coverage
                    && !(historical_cap && exceeds_item_history(line, bumped))
            };
            let candidate = pick_line(group, eligible, |(a, la), (b, lb)| {
                la.hero_item
                    .cmp(&lb.hero_item)
                    .then_with(|| line_coverage(la, qty[a]).total_cmp(&line_coverage(lb, qty[b])))
            });
            let Some(i) = candidate else { break };

            let case = f64::from(group[i].case_pack);
            qty[i] += case;
            touched[i] = true;
            cases_moved += 1;
            qty_delta += case;
        }

        let reason = if cases_moved > 0 {
            StorePassReason::CoverageAdd
        } else {
            StorePassReason::None
        };
        StorePassOutcome {
            reason,
            cases_moved,
            qty_delta,
        }
    }
}

impl Default for StorePassAdjuster {
    fn default() -> Self {
        Self::new(StorePassConfig::default())
    }
}

// ==========================================
// 门店指标
// ==========================================

/// 门店第 week 周历史损耗; 该周无出货返回 None
fn store_weekly_shrink(group: &[ForecastLine], week: usize) -> Option<f64> {
    if week >= 4 {
        return None;
    }
    let shipped: f64 = group.iter().map(|l| l.history.shipped[week]).sum();
    if shipped <= 0.0 {
        return None;
    }
    let sold: f64 = group.iter().map(|l| l.history.sold[week]).sum();
    Some((shipped - sold) / shipped)
}

/// 门店近四周最高周销量
fn store_max_weekly_sold(group: &[ForecastLine]) -> f64 {
    (0..4)
        .map(|w| group.iter().map(|l| l.history.sold[w]).sum::<f64>())
        .fold(0.0, f64::max)
}

/// 数量是否超过该行自身近四周最高销量 (无销售历史不算超出)
fn exceeds_item_history(line: &ForecastLine, qty: f64) -> bool {
    let item_max = line.history.sold.iter().copied().fold(0.0, f64::max);
    item_max > 0.0 && qty > item_max
}

/// 预测损耗 (Σqty − Σbaseline) / Σqty
fn projected_shrink(group: &[ForecastLine], qty: &[f64]) -> Option<f64> {
    let total: f64 = qty.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let baseline: f64 = group.iter().map(|l| l.baseline.baseline_qty).sum();
    Some((total - baseline) / total)
}

/// 门店覆盖 Σqty / Σbaseline − 1
fn store_coverage(group: &[ForecastLine], qty: &[f64]) -> Option<f64> {
    let baseline: f64 = group.iter().map(|l| l.baseline.baseline_qty).sum();
    if baseline <= 0.0 {
        return None;
    }
    Some(qty.iter().sum::<f64>() / baseline - 1.0)
}

fn line_coverage(line: &ForecastLine, qty: f64) -> f64 {
    if line.baseline.baseline_qty > 0.0 {
        qty / line.baseline.baseline_qty
    } else {
        f64::INFINITY
    }
}

/// 选出优先级最高的候选行; 同序时按单品号、输入位置
fn pick_line<F, C>(group: &[ForecastLine], eligible: F, order: C) -> Option<usize>
where
    F: Fn(usize, &ForecastLine) -> bool,
    C: Fn((usize, &ForecastLine), (usize, &ForecastLine)) -> Ordering,
{
    group
        .iter()
        .enumerate()
        .filter(|(i, line)| eligible(*i, line))
        .min_by(|(a, la), (b, lb)| {
            order((*a, *la), (*b, *lb))
                .then_with(|| la.item_no.cmp(&lb.item_no))
                .then_with(|| a.cmp(b))
        })
        .map(|(i, _)| i)
}
