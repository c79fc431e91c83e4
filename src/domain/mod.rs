// ==========================================
// 门店订货预测系统 - 领域模型层
// ==========================================
// 职责: 定义预测行、调整规则、天气观测、汇总行
// 红线: 不含引擎逻辑,不做 I/O
// ==========================================

pub mod adjustment;
pub mod aggregate;
pub mod error;
pub mod forecast_line;
pub mod types;
pub mod weather;

// 重导出核心类型
pub use adjustment::{AdjustmentRegistry, AdjustmentRule, RawAdjustmentRule};
pub use aggregate::{AggregateLevel, AggregateRow, AggregationReport, QtyCount};
pub use error::{DomainError, DomainResult};
pub use forecast_line::{
    AppliedAdjustment, BaselineSelection, ForecastLine, ForecastLineInput, SalesHistory,
    WaterfallRecord, WaterfallStage,
};
pub use types::{
    AdjustmentType, BaselineSource, RoundingDirection, SeverityCategory, StageKind,
    StorePassReason,
};
pub use weather::{WeatherObservation, WeatherSeverity};
