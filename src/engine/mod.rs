// ==========================================
// 门店订货预测系统 - 引擎层
// ==========================================
// 职责: 瀑布各阶段的业务规则
// 红线: 引擎不做 I/O,每个阶段都记录 delta
// ==========================================

pub mod adjustment;
pub mod aggregator;
pub mod baseline;
pub mod error;
pub mod pipeline;
pub mod rounding;
pub mod rule_matcher;
pub mod safety_stock;
pub mod store_pass;
pub mod trend;
pub mod weather_adjuster;
pub mod weather_severity;

// 重导出核心引擎
pub use adjustment::AdjustmentEngine;
pub use aggregator::WaterfallAggregator;
pub use baseline::BaselineSelector;
pub use error::EngineError;
pub use pipeline::{LineFailure, WaterfallBatchResult, WaterfallPipeline};
pub use rounding::RoundingEngine;
pub use rule_matcher::{MatchKey, RuleMatcher};
pub use safety_stock::SafetyStockCalculator;
pub use store_pass::{StorePassAdjuster, StorePassOutcome};
pub use trend::TrendAdjuster;
pub use weather_adjuster::{WeatherAdjuster, WeatherOutcome};
pub use weather_severity::WeatherSeverityScorer;
