// ==========================================
// 门店订货预测系统 - 核心库
// ==========================================
// 职责: 门店 × 单品 × 日期 的订货量瀑布计算
// 系统定位: 纯计算核心 (数据获取/报表/持久化由外部协作方负责)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 瀑布各阶段
pub mod engine;

// 导入层 - 规则校验
pub mod importer;

// 配置层 - 运行参数
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AdjustmentType, BaselineSource, RoundingDirection, SeverityCategory, StageKind,
    StorePassReason,
};

// 领域实体
pub use domain::{
    AdjustmentRegistry, AdjustmentRule, AggregateLevel, AggregateRow, AggregationReport,
    DomainError, ForecastLine, ForecastLineInput, RawAdjustmentRule, SalesHistory, WaterfallRecord,
    WeatherObservation, WeatherSeverity,
};

// 引擎
pub use engine::{
    AdjustmentEngine, BaselineSelector, EngineError, RoundingEngine, RuleMatcher,
    SafetyStockCalculator, StorePassAdjuster, TrendAdjuster, WaterfallAggregator,
    WaterfallBatchResult, WaterfallPipeline, WeatherAdjuster, WeatherSeverityScorer,
};

// 导入与配置
pub use config::{ConfigError, WaterfallConfig};
pub use importer::{ImportError, RuleImporter};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "门店订货预测系统";
