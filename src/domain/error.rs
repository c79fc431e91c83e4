// ==========================================
// 门店订货预测系统 - 领域错误类型
// ==========================================
// 职责: 输入记录构造预测行时的数据校验错误
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    #[error("箱规缺失或为 0 (门店 {store_no}, 单品 {item_no}, 日期 {date}): {case_pack:?}")]
    InvalidCasePack {
        store_no: String,
        item_no: String,
        date: NaiveDate,
        case_pack: Option<u32>,
    },
}

pub type DomainResult<T> = Result<T, DomainError>;
