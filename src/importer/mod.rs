// ==========================================
// 门店订货预测系统 - 导入层
// ==========================================
// 职责: 外部规则记录校验,生成只读规则库
// ==========================================

pub mod error;
pub mod rule_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use rule_importer::{RuleImportReport, RuleImporter, RuleViolation, RuleViolationSummary};
