// ==========================================
// 门店订货预测系统 - 规则调整引擎
// ==========================================
// 职责: 按规范类型顺序对运行数量连乘命中规则的倍数
// 输入: ForecastLine + AdjustmentRegistry + 生效日期
// 输出: 每条命中规则一个瀑布阶段 + 每类型调整明细
// ==========================================
// 红线: 每类型至多一条规则生效
// 红线: 未命中类型倍数为 1,不记录阶段
// ==========================================

use crate::domain::adjustment::AdjustmentRegistry;
use crate::domain::forecast_line::{AppliedAdjustment, ForecastLine};
use crate::domain::types::AdjustmentType;
use crate::engine::rule_matcher::{MatchKey, RuleMatcher};
use chrono::NaiveDate;
use tracing::debug;

pub struct AdjustmentEngine {
    matcher: RuleMatcher,
}

impl AdjustmentEngine {
    pub fn new() -> Self {
        Self {
            matcher: RuleMatcher::new(),
        }
    }

    /// 对单行应用全部类型的调整
    ///
    /// # 参数
    /// - `line`: 预测行 (已设置基线)
    /// - `registry`: 只读规则库
    /// - `as_of_date`: 规则生效判定日期 (通常为预测日期)
    ///
    /// # 返回
    /// 本行合计调整量
    pub fn apply(
        &self,
        line: &mut ForecastLine,
        registry: &AdjustmentRegistry,
        as_of_date: NaiveDate,
    ) -> f64 {
        let hits = {
            let key = MatchKey {
                region_code: &line.region_code,
                store_no: &line.store_no,
                item_no: &line.item_no,
                as_of_date,
            };
            self.matcher
                .match_all(registry, &key)
                .map(|hit| hit.map(|r| (r.name.clone(), r.multiplier)))
        };

        let mut adjustments = Vec::with_capacity(AdjustmentType::ALL.len());
        let mut total = 0.0;

        for (adjustment_type, hit) in AdjustmentType::ALL.into_iter().zip(hits) {
            let Some((name, multiplier)) = hit else {
                adjustments.push(AppliedAdjustment::unmatched(adjustment_type));
                continue;
            };

            let before = line.quantity;
            let applied = line.apply_adjustment_stage(
                adjustment_type,
                &name,
                before * multiplier - before,
            );
            total += applied;

            debug!(
                store_no = %line.store_no,
                item_no = %line.item_no,
                adjustment_type = %adjustment_type,
                rule = %name,
                multiplier,
                delta = applied,
                "规则调整命中"
            );

            adjustments.push(AppliedAdjustment {
                adjustment_type,
                applied: true,
                name,
                multiplier,
                qty: applied,
                count: 1,
            });
        }

        line.adjustments = adjustments;
        total
    }
}

impl Default for AdjustmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adjustment::AdjustmentRule;
    use crate::domain::forecast_line::{ForecastLineInput, SalesHistory};
    use crate::domain::types::StageKind;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn line(quantity: f64) -> ForecastLine {
        let mut line = ForecastLine::from_input(ForecastLineInput {
            region_code: "BA".to_string(),
            store_no: "101".to_string(),
            item_no: "5001".to_string(),
            date_forecast: date(3),
            history: SalesHistory::new([100.0; 4], [110.0; 4]),
            case_pack: Some(10),
            hero_item: false,
            sold_out_last_week: None,
        })
        .unwrap();
        line.start_waterfall(quantity);
        line
    }

    fn rule(t: AdjustmentType, name: &str, multiplier: f64) -> AdjustmentRule {
        AdjustmentRule {
            adjustment_type: t,
            name: name.to_string(),
            regions: None,
            stores: None,
            items: None,
            start_date: date(1),
            end_date: date(7),
            multiplier,
        }
    }

    #[test]
    fn test_types_apply_in_canonical_order() {
        // 插入顺序与规范顺序相反
        let registry = AdjustmentRegistry::new(vec![
            rule(AdjustmentType::Regional, "Region", 0.9),
            rule(AdjustmentType::Promo, "Promo", 1.1),
        ]);
        let mut line = line(100.0);
        AdjustmentEngine::new().apply(&mut line, &registry, date(3));

        let names: Vec<_> = line.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Promo", "Region"]);
        assert!((line.stages[0].delta - 10.0).abs() < 1e-9);
        assert!((line.stages[1].delta + 11.0).abs() < 1e-9);
        assert!((line.quantity - 99.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_of_one_counts_as_applied() {
        let registry = AdjustmentRegistry::new(vec![rule(AdjustmentType::Cannibalism, "Flat", 1.0)]);
        let mut line = line(50.0);
        AdjustmentEngine::new().apply(&mut line, &registry, date(3));

        let adj = line.adjustment(AdjustmentType::Cannibalism).unwrap();
        assert!(adj.applied);
        assert_eq!(adj.count, 1);
        assert_eq!(adj.qty, 0.0);
        assert_eq!(line.stage_total(StageKind::Adjustment), 0.0);
    }

    #[test]
    fn test_every_type_recorded_once() {
        let registry = AdjustmentRegistry::new(vec![
            rule(AdjustmentType::Promo, "A", 1.2),
            rule(AdjustmentType::Promo, "B", 1.5),
        ]);
        let mut line = line(10.0);
        AdjustmentEngine::new().apply(&mut line, &registry, date(3));

        assert_eq!(line.adjustments.len(), 8);
        let promo = line.adjustment(AdjustmentType::Promo).unwrap();
        assert_eq!(promo.name, "A");
        let holiday = line.adjustment(AdjustmentType::HolidayIncrease).unwrap();
        assert!(!holiday.applied);
        assert_eq!(holiday.multiplier, 1.0);
        assert!(holiday.name.is_empty());
    }

    #[test]
    fn test_out_of_window_rule_is_noop() {
        let registry = AdjustmentRegistry::new(vec![rule(AdjustmentType::Promo, "Promo", 1.15)]);
        let mut line = line(100.0);
        let total = AdjustmentEngine::new().apply(&mut line, &registry, date(8));

        assert_eq!(total, 0.0);
        assert!(line.stages.is_empty());
        assert_eq!(line.quantity, 100.0);
    }
}
