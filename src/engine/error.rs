// ==========================================
// 门店订货预测系统 - 引擎错误类型
// ==========================================
// 行级错误: 出错的行被剔除,整批继续
// ==========================================

use crate::domain::error::DomainError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    #[error("箱规非法 (门店 {store_no}, 单品 {item_no}, 日期 {date}): {case_pack:?}")]
    InvalidCasePack {
        store_no: String,
        item_no: String,
        date: NaiveDate,
        case_pack: Option<u32>,
    },
}

// ==========================================
// 从 DomainError 转换
// ==========================================
impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidCasePack {
                store_no,
                item_no,
                date,
                case_pack,
            } => EngineError::InvalidCasePack {
                store_no,
                item_no,
                date,
                case_pack,
            },
        }
    }
}
