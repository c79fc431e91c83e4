// ==========================================
// 门店订货预测系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

/// 调整规则导入错误 (单条规则级别,不中断整批)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    // ===== 字段缺失 =====
    #[error("必填字段缺失 (规则 {index}): {field}")]
    MissingField { index: usize, field: &'static str },

    // ===== 取值错误 =====
    #[error("未知调整类型 (规则 {index}): {value}")]
    UnknownAdjustmentType { index: usize, value: String },

    #[error("日期区间非法 (规则 {index}): start_date {start} 晚于 end_date {end}")]
    InvalidDateRange {
        index: usize,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("倍数非法 (规则 {index}): {value},必须为大于 0 的有限数")]
    InvalidMultiplier { index: usize, value: f64 },

    #[error("过滤维度为空列表 (规则 {index}, 字段 {field}),不限制请省略该字段")]
    EmptyFilter { index: usize, field: &'static str },
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
