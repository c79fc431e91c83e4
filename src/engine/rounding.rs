// ==========================================
// 门店订货预测系统 - 箱规取整引擎
// ==========================================
// 职责: 运行数量对齐到箱规整数倍
// 红线: 正数量取整后至少一箱
// 红线: 取整幂等 (对齐的数量再取整不变)
// ==========================================

use crate::config::waterfall_config::RoundingConfig;
use crate::domain::forecast_line::{ForecastLine, QTY_EPSILON};
use crate::domain::types::{RoundingDirection, StageKind};

pub struct RoundingEngine {
    config: RoundingConfig,
}

impl RoundingEngine {
    pub fn new(config: RoundingConfig) -> Self {
        Self { config }
    }

    /// 取整并记录 rnd_net 阶段
    ///
    /// # 返回
    /// 取整带来的净变化量 (向上为正)
    pub fn apply(&self, line: &mut ForecastLine) -> f64 {
        let (rounded, direction) = self.round(line.quantity, line.case_pack);
        let delta = line.apply_stage(
            StageKind::Rounding,
            StageKind::Rounding.label(),
            rounded - line.quantity,
        );
        line.rounding_direction = direction;
        delta
    }

    /// 纯计算: 数量 + 箱规 → (取整结果, 方向)
    pub fn round(&self, qty: f64, case_pack: u32) -> (f64, RoundingDirection) {
        if !qty.is_finite() || qty <= 0.0 || case_pack == 0 {
            return (0.0, RoundingDirection::None);
        }

        let case = f64::from(case_pack);
        let whole_cases = (qty / case).floor();
        let remainder = qty - whole_cases * case;

        // 不足一箱的正数量 (含极小值) 补足一箱
        if whole_cases < 1.0 {
            if case - remainder <= QTY_EPSILON {
                return (case, RoundingDirection::None);
            }
            return (case, RoundingDirection::Up);
        }

        // 浮点误差内视为已对齐
        if remainder <= QTY_EPSILON {
            return (whole_cases * case, RoundingDirection::None);
        }
        if case - remainder <= QTY_EPSILON {
            return ((whole_cases + 1.0) * case, RoundingDirection::None);
        }

        if remainder > self.config.round_up_fraction * case {
            ((whole_cases + 1.0) * case, RoundingDirection::Up)
        } else {
            (whole_cases * case, RoundingDirection::Down)
        }
    }
}

impl Default for RoundingEngine {
    fn default() -> Self {
        Self::new(RoundingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_and_down() {
        let engine = RoundingEngine::default();
        assert_eq!(engine.round(115.0, 12), (120.0, RoundingDirection::Up));
        assert_eq!(engine.round(100.0, 12), (96.0, RoundingDirection::Down));
        // 余数恰为半箱向下
        assert_eq!(engine.round(18.0, 12), (12.0, RoundingDirection::Down));
    }

    #[test]
    fn test_positive_quantity_never_rounds_to_zero() {
        let engine = RoundingEngine::default();
        assert_eq!(engine.round(2.0, 12), (12.0, RoundingDirection::Up));
        assert_eq!(engine.round(0.0001, 6), (6.0, RoundingDirection::Up));
    }

    #[test]
    fn test_sub_epsilon_quantity_rounds_to_one_case() {
        let engine = RoundingEngine::default();
        assert_eq!(engine.round(1e-7, 12), (12.0, RoundingDirection::Up));
        assert_eq!(engine.round(f64::MIN_POSITIVE, 1), (1.0, RoundingDirection::Up));
        assert_eq!(engine.round(QTY_EPSILON, 6), (6.0, RoundingDirection::Up));
    }

    #[test]
    fn test_non_positive_quantity_rounds_to_zero() {
        let engine = RoundingEngine::default();
        assert_eq!(engine.round(0.0, 12), (0.0, RoundingDirection::None));
        assert_eq!(engine.round(-4.0, 12), (0.0, RoundingDirection::None));
        assert_eq!(engine.round(f64::NAN, 12), (0.0, RoundingDirection::None));
    }

    #[test]
    fn test_rounding_is_idempotent() {
        let engine = RoundingEngine::default();
        for qty in [1.0, 5.5, 11.9, 12.0, 13.0, 47.3, 100.0, 239.99] {
            for case_pack in [1, 4, 6, 12, 24] {
                let (once, _) = engine.round(qty, case_pack);
                let (twice, direction) = engine.round(once, case_pack);
                assert_eq!(once, twice);
                assert_eq!(direction, RoundingDirection::None);
                assert_eq!(once % f64::from(case_pack), 0.0);
            }
        }
    }

    #[test]
    fn test_float_noise_is_treated_as_aligned() {
        let engine = RoundingEngine::default();
        assert_eq!(engine.round(115.00000000000001 - 19.0, 12), (96.0, RoundingDirection::None));
        assert_eq!(engine.round(23.9999999999, 12), (24.0, RoundingDirection::None));
    }
}
