// ==========================================
// 门店订货预测系统 - 覆盖与安全库存计算器
// ==========================================
// 职责:
//   - base_cover   : 取整前按比例追加基础覆盖
//   - safety_stock : 取整后按波动率追加整箱缓冲
//   - cover_so     : 上周售罄追加整箱覆盖
//   - cover_guardrail : 上周零损耗的行,有效覆盖封顶
// 区域覆写: 覆盖率按 (区域, 日期) 取 CoverConfig::rates_for
// 红线: 取整后追加/削减量均为整箱,保持箱规对齐
// ==========================================

use crate::config::waterfall_config::{CoverConfig, SafetyStockConfig};
use crate::domain::forecast_line::{ForecastLine, QTY_EPSILON};
use crate::domain::types::StageKind;
use tracing::debug;

pub struct SafetyStockCalculator {
    safety: SafetyStockConfig,
    cover: CoverConfig,
}

impl SafetyStockCalculator {
    pub fn new(safety: SafetyStockConfig, cover: CoverConfig) -> Self {
        Self { safety, cover }
    }

    // ==========================================
    // 取整前
    // ==========================================

    /// 基础覆盖: quantity × base_cover (区域覆写优先)
    pub fn apply_base_cover(&self, line: &mut ForecastLine) -> f64 {
        let rates = self.cover.rates_for(&line.region_code, line.date_forecast);
        let delta = (line.quantity * rates.base_cover).max(0.0);
        line.apply_stage(StageKind::BaseCover, StageKind::BaseCover.label(), delta)
    }

    // ==========================================
    // 取整后
    // ==========================================

    /// 追加安全库存与售罄覆盖
    ///
    /// # 参数
    /// - `rounding_delta`: 取整阶段净变化 (向上取整部分可抵扣缓冲)
    pub fn apply(&self, line: &mut ForecastLine, rounding_delta: f64) {
        let (_, safety) = self.add_safety(
            line.quantity,
            line.baseline.volatility,
            rounding_delta,
            line.case_pack,
        );
        line.apply_stage(StageKind::SafetyStock, StageKind::SafetyStock.label(), safety);

        if line.sold_out_last_week {
            let rate = self.cover.rates_for(&line.region_code, line.date_forecast).sold_out_cover;
            let cover = self.sold_out_cover(line.baseline.baseline_qty, rate, line.case_pack);
            if cover > 0.0 {
                line.apply_stage(StageKind::CoverSoldOut, StageKind::CoverSoldOut.label(), cover);
            }
        }
    }

    /// 纯计算: (数量, 波动率, 取整净变化, 箱规) → (追加后数量, 追加量)
    ///
    /// 原始缓冲 floor(k × 波动率) 先扣除向上取整已带来的余量,剩余部分按整箱补足
    pub fn add_safety(
        &self,
        qty: f64,
        volatility: f64,
        rounding_delta: f64,
        case_pack: u32,
    ) -> (f64, f64) {
        if qty <= 0.0 || case_pack == 0 || !volatility.is_finite() {
            return (qty.max(0.0), 0.0);
        }

        let raw = (self.safety.k_factor * volatility).floor();
        let remaining = raw - rounding_delta.max(0.0);
        if remaining <= 0.0 {
            return (qty, 0.0);
        }

        let case = f64::from(case_pack);
        let delta = (remaining / case).ceil() * case;
        (qty + delta, delta)
    }

    /// 售罄覆盖: ceil(基线 × rate / 箱规) 箱
    pub fn sold_out_cover(&self, baseline_qty: f64, rate: f64, case_pack: u32) -> f64 {
        if baseline_qty <= 0.0 || case_pack == 0 {
            return 0.0;
        }
        let case = f64::from(case_pack);
        (baseline_qty * rate / case).ceil() * case
    }

    // ==========================================
    // 有效覆盖封顶
    // ==========================================

    /// 上周零损耗且超过两箱的行,数量封顶到 ceil(基线 × (1 + sold_out_cover)) 整箱
    ///
    /// 仅在实际削减时记录 cover_guardrail 阶段
    pub fn apply_cover_guardrail(&self, line: &mut ForecastLine) -> f64 {
        if !self.cover.guardrail_enabled {
            return 0.0;
        }
        let zero_shrink = line
            .history
            .weekly_shrink(0)
            .map_or(false, |s| s.abs() <= QTY_EPSILON);
        if !zero_shrink || line.current_cases() <= 2.0 {
            return 0.0;
        }

        let rate = self.cover.rates_for(&line.region_code, line.date_forecast).sold_out_cover;
        let Some(target) =
            self.guardrail_target(line.quantity, line.baseline.baseline_qty, rate, line.case_pack)
        else {
            return 0.0;
        };

        debug!(
            store_no = %line.store_no,
            item_no = %line.item_no,
            before = line.quantity,
            target,
            "有效覆盖封顶"
        );
        line.apply_stage(
            StageKind::CoverGuardrail,
            StageKind::CoverGuardrail.label(),
            target - line.quantity,
        )
    }

    /// 纯计算: 超过封顶时返回封顶后的数量
    pub fn guardrail_target(
        &self,
        qty: f64,
        baseline_qty: f64,
        rate: f64,
        case_pack: u32,
    ) -> Option<f64> {
        if baseline_qty <= 0.0 || case_pack == 0 || qty / baseline_qty <= 1.0 + rate {
            return None;
        }
        let case = f64::from(case_pack);
        let target = (baseline_qty * (1.0 + rate) / case).ceil() * case;
        (target < qty - QTY_EPSILON).then_some(target)
    }
}

impl Default for SafetyStockCalculator {
    fn default() -> Self {
        Self::new(SafetyStockConfig::default(), CoverConfig::default())
    }
}
