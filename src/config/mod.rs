// ==========================================
// 门店订货预测系统 - 配置层
// ==========================================
// 职责: 运行参数定义、默认值与校验
// ==========================================

pub mod waterfall_config;

pub use waterfall_config::{
    BaselineConfig, ConfigError, ConfigResult, CoverConfig, CoverRates, RegionCoverOverride,
    RoundingConfig, SafetyStockConfig, StorePassConfig, TrendConfig, WaterfallConfig,
    WeatherConfig,
};
