// ==========================================
// 门店订货预测系统 - 命令行入口
// ==========================================
// 用法:
//   store-order-forecast <batch.json> [config.json]
//
// batch.json: { "rules": [...], "lines": [...], "weather": [...] }
// 输出: 结果 JSON 写到 stdout, 日志写到 stderr
// 日志格式: FORECAST_LOG_FORMAT=json 时输出 JSON 行
// ==========================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use store_order_forecast::domain::aggregate::AggregateLevel;
use store_order_forecast::importer::RuleViolationSummary;
use store_order_forecast::engine::LineFailure;
use store_order_forecast::{
    logging, AggregationReport, ForecastLine, ForecastLineInput, RawAdjustmentRule, RuleImporter,
    WaterfallConfig, WaterfallPipeline, WeatherObservation,
};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct BatchInput {
    #[serde(default)]
    rules: Vec<RawAdjustmentRule>,
    lines: Vec<ForecastLineInput>,
    #[serde(default)]
    weather: Vec<WeatherObservation>,
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    run_id: Uuid,
    version: &'static str,
    rule_violations: Vec<RuleViolationSummary>,
    lines: Vec<ForecastLine>,
    errors: Vec<LineFailure>,
    region_summary: AggregationReport,
    store_summary: AggregationReport,
}

fn main() -> Result<()> {
    match std::env::var("FORECAST_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    let mut args = std::env::args().skip(1);
    let batch_path = args
        .next()
        .context("缺少参数: <batch.json> [config.json]")?;
    let config_path = args.next();

    let config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("配置文件读取失败: {}", path))?;
            WaterfallConfig::from_json_str(&text)
                .with_context(|| format!("配置文件非法: {}", path))?
        }
        None => WaterfallConfig::default(),
    };

    let text = std::fs::read_to_string(&batch_path)
        .with_context(|| format!("批次文件读取失败: {}", batch_path))?;
    let batch: BatchInput = serde_json::from_str(&text)
        .with_context(|| format!("批次文件解析失败: {}", batch_path))?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", store_order_forecast::APP_NAME, store_order_forecast::VERSION);
    tracing::info!(
        rules = batch.rules.len(),
        lines = batch.lines.len(),
        weather = batch.weather.len(),
        "批次已加载"
    );
    tracing::info!("==================================================");

    let import = RuleImporter::new().import(batch.rules);
    let pipeline = WaterfallPipeline::new(config);
    tracing::debug!(config = ?pipeline.config(), "运行参数");
    let result = pipeline.run(batch.lines, &import.registry, &batch.weather);

    let inconsistent = result
        .records()
        .iter()
        .filter(|record| !record.is_consistent(1e-6))
        .count();
    if inconsistent > 0 {
        tracing::warn!(inconsistent, "瀑布记录不守恒");
    }

    let output = BatchOutput {
        run_id: result.run_id,
        version: store_order_forecast::VERSION,
        rule_violations: import.violation_summaries(),
        region_summary: result.aggregate(AggregateLevel::Region),
        store_summary: result.aggregate(AggregateLevel::Store),
        lines: result.lines,
        errors: result.errors,
    };

    let json = serde_json::to_string_pretty(&output).context("结果序列化失败")?;
    println!("{}", json);
    Ok(())
}
