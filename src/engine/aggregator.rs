// ==========================================
// 门店订货预测系统 - 瀑布汇总器
// ==========================================
// 职责: 预测行 → (区域|门店, 日期) 汇总行
// 红线: 纯求和归约,分片合并顺序不影响结果
// ==========================================

use crate::domain::aggregate::{AggregateLevel, AggregateRow, AggregationReport};
use crate::domain::forecast_line::ForecastLine;
use crate::domain::types::{RoundingDirection, StageKind};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

type RowMap = BTreeMap<(String, NaiveDate), AggregateRow>;

pub struct WaterfallAggregator {}

impl WaterfallAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 汇总并附带被剔除行数
    pub fn report(
        &self,
        lines: &[ForecastLine],
        level: AggregateLevel,
        excluded_lines: usize,
    ) -> AggregationReport {
        AggregationReport {
            rows: self.aggregate(lines, level),
            excluded_lines,
        }
    }

    /// 并行分片汇总后合并 (按键排序输出)
    pub fn aggregate(&self, lines: &[ForecastLine], level: AggregateLevel) -> Vec<AggregateRow> {
        let rows = lines
            .par_iter()
            .fold(RowMap::new, |mut acc, line| {
                let row = self.row_for_line(line, level);
                merge_row(&mut acc, row);
                acc
            })
            .reduce(RowMap::new, |mut left, right| {
                for (_, row) in right {
                    merge_row(&mut left, row);
                }
                left
            });

        debug!(lines = lines.len(), rows = rows.len(), level = ?level, "汇总完成");
        rows.into_values().collect()
    }

    /// 单行汇总贡献
    pub fn row_for_line(&self, line: &ForecastLine, level: AggregateLevel) -> AggregateRow {
        let key = match level {
            AggregateLevel::Region => line.region_code.as_str(),
            AggregateLevel::Store => line.store_no.as_str(),
        };
        let mut row = AggregateRow::empty(level, key, line.date_forecast);

        row.line_count = 1;
        row.lw_sold = line.history.lw_sold();
        row.lw_shipped = line.history.lw_shipped();

        row.baseline_by_source
            .entry(line.baseline.source)
            .or_default()
            .add(line.baseline.baseline_qty);

        for adj in line.adjustments.iter().filter(|a| a.applied) {
            row.adjustment_by_type
                .entry(adj.adjustment_type)
                .or_default()
                .add(adj.qty);
        }

        for stage in line.stages.iter().filter(|s| s.delta != 0.0) {
            row.stage_by_kind.entry(stage.kind).or_default().add(stage.delta);
        }

        let rounding = line.stage_total(StageKind::Rounding);
        match line.rounding_direction {
            RoundingDirection::Up => row.rounding_up.add(rounding),
            RoundingDirection::Down => row.rounding_down.add(rounding),
            RoundingDirection::None => {}
        }

        if line.store_grow_qty > 0.0 {
            row.store_pass_growth.add(line.store_grow_qty);
        }
        if line.store_decline_qty > 0.0 {
            row.store_pass_decline.add(line.store_decline_qty);
        }
        if line.weather_adjustment_qty < 0.0 {
            row.weather.add(line.weather_adjustment_qty);
        }

        row.pre_store_pass_qty = line.pre_store_pass_qty;
        row.pre_weather_qty = line.pre_weather_qty;
        row.final_units = line.final_units();
        row.final_cases = line.final_cases();
        row.anomaly_count = u64::from(line.anomaly);
        row
    }
}

impl Default for WaterfallAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_row(target: &mut RowMap, row: AggregateRow) {
    let key = (row.key.clone(), row.date_forecast);
    match target.get_mut(&key) {
        Some(existing) => existing.merge(&row),
        None => {
            target.insert(key, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast_line::{ForecastLineInput, SalesHistory};
    use crate::domain::types::BaselineSource;

    fn line(region: &str, store: &str, item: &str, qty: f64) -> ForecastLine {
        let mut line = ForecastLine::from_input(ForecastLineInput {
            region_code: region.to_string(),
            store_no: store.to_string(),
            item_no: item.to_string(),
            date_forecast: NaiveDate::from_ymd_opt(2026, 7, 3).unwrap(),
            history: SalesHistory::new([10.0; 4], [12.0; 4]),
            case_pack: Some(6),
            hero_item: false,
            sold_out_last_week: Some(false),
        })
        .unwrap();
        line.baseline.baseline_qty = 10.0;
        line.start_waterfall(qty);
        line
    }

    #[test]
    fn test_region_rollup_sums_lines() {
        let lines = vec![
            line("BA", "101", "A", 12.0),
            line("BA", "102", "A", 18.0),
            line("LA", "201", "A", 6.0),
        ];
        let rows = WaterfallAggregator::new().aggregate(&lines, AggregateLevel::Region);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "BA");
        assert_eq!(rows[0].line_count, 2);
        assert_eq!(rows[0].final_units, 30);
        assert_eq!(rows[0].final_cases, 5);
        assert_eq!(rows[0].lw_shipped, 24.0);
        let lw = rows[0].baseline_by_source[&BaselineSource::LwSales];
        assert_eq!(lw.count, 2);
        assert_eq!(lw.qty, 20.0);
    }

    #[test]
    fn test_zero_stages_are_not_counted() {
        let mut l = line("BA", "101", "A", 12.0);
        l.apply_stage(StageKind::StorePass, "store_pass", 0.0);
        l.apply_stage(StageKind::Weather, "weather", -6.0);
        l.weather_adjustment_qty = -6.0;

        let row = WaterfallAggregator::new().row_for_line(&l, AggregateLevel::Store);
        assert!(!row.stage_by_kind.contains_key(&StageKind::StorePass));
        assert_eq!(row.stage_by_kind[&StageKind::Weather].qty, -6.0);
        assert_eq!(row.weather.count, 1);
    }
}
