// ==========================================
// 门店订货预测系统 - 预测行领域模型
// ==========================================
// 职责: 单个 (区域, 门店, 单品, 日期) 的瀑布计算单元
// 红线: 数量在任何阶段后不得为负
// 红线: final == start + Σ(stage.delta)
// ==========================================

use crate::domain::types::{
    AdjustmentType, BaselineSource, RoundingDirection, SeverityCategory, StageKind,
    StorePassReason,
};
use crate::domain::error::{DomainError, DomainResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 数值容差 (浮点比较)
pub const QTY_EPSILON: f64 = 1e-6;

// ==========================================
// SalesHistory - 四周销售/出货历史
// ==========================================
// 下标 0 = 上周 (最近), 下标 3 = 四周前
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesHistory {
    pub sold: [f64; 4],
    pub shipped: [f64; 4],
}

impl SalesHistory {
    /// 构造并清洗: 非有限值与负值按 0 处理
    pub fn new(sold: [f64; 4], shipped: [f64; 4]) -> Self {
        Self {
            sold: sold.map(sanitize),
            shipped: shipped.map(sanitize),
        }
    }

    pub fn lw_sold(&self) -> f64 {
        self.sold[0]
    }

    pub fn lw_shipped(&self) -> f64 {
        self.shipped[0]
    }

    /// 第 week 周的损耗率 (shipped - sold) / shipped; 无出货返回 None
    pub fn weekly_shrink(&self, week: usize) -> Option<f64> {
        let shipped = *self.shipped.get(week)?;
        if shipped <= 0.0 {
            return None;
        }
        Some((shipped - self.sold[week]) / shipped)
    }

    /// 上周是否售罄 (销量 >= 出货且有出货)
    pub fn was_sold_out_last_week(&self) -> bool {
        self.shipped[0] > 0.0 && self.sold[0] >= self.shipped[0]
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

// ==========================================
// ForecastLineInput - 外部数据准备的输入记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastLineInput {
    pub region_code: String,
    pub store_no: String,
    pub item_no: String,
    pub date_forecast: NaiveDate,
    pub history: SalesHistory,
    #[serde(default)]
    pub case_pack: Option<u32>,
    #[serde(default)]
    pub hero_item: bool,
    /// 缺省时由历史推导 (上周销量 >= 出货)
    #[serde(default)]
    pub sold_out_last_week: Option<bool>,
}

// ==========================================
// WaterfallStage - 瀑布阶段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStage {
    pub kind: StageKind,
    pub name: String,
    pub delta: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_type: Option<AdjustmentType>,
}

// ==========================================
// WaterfallRecord - 单行瀑布审计记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallRecord {
    pub start_quantity: f64,
    pub stages: Vec<WaterfallStage>,
    pub final_quantity: f64,
}

impl WaterfallRecord {
    pub fn total_delta(&self) -> f64 {
        self.stages.iter().map(|s| s.delta).sum()
    }

    /// final == start + Σdelta (容差内)
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        (self.start_quantity + self.total_delta() - self.final_quantity).abs() <= tolerance
    }
}

// ==========================================
// AppliedAdjustment - 单类型调整结果
// ==========================================
// 每个类型在每行上只写入一次; 未命中为 1.0 倍/空名/零值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub adjustment_type: AdjustmentType,
    pub applied: bool,
    pub name: String,
    pub multiplier: f64,
    pub qty: f64,
    pub count: u32,
}

impl AppliedAdjustment {
    pub fn unmatched(adjustment_type: AdjustmentType) -> Self {
        Self {
            adjustment_type,
            applied: false,
            name: String::new(),
            multiplier: 1.0,
            qty: 0.0,
            count: 0,
        }
    }
}

// ==========================================
// BaselineSelection - 基线选择结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSelection {
    pub source: BaselineSource,
    pub baseline_qty: f64, // 基线数量 (forecast average)
    pub start_qty: f64,    // 瀑布起点
    pub ema_uplift: f64,   // 仅 ema 分支 > 0
    pub ema: f64,
    pub average_sold: f64,
    pub velocity: f64,
    pub volatility: f64,
}

impl Default for BaselineSelection {
    fn default() -> Self {
        Self {
            source: BaselineSource::LwSales,
            baseline_qty: 0.0,
            start_qty: 0.0,
            ema_uplift: 0.0,
            ema: 0.0,
            average_sold: 0.0,
            velocity: 0.0,
            volatility: 0.0,
        }
    }
}

// ==========================================
// ForecastLine - 预测行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastLine {
    // ===== 主键 =====
    pub region_code: String,
    pub store_no: String,
    pub item_no: String,
    pub date_forecast: NaiveDate,

    // ===== 输入 =====
    pub history: SalesHistory,
    pub case_pack: u32,
    pub hero_item: bool,
    pub sold_out_last_week: bool,

    // ===== 基线 =====
    pub baseline: BaselineSelection,

    // ===== 瀑布 =====
    pub start_quantity: f64,
    pub quantity: f64,
    pub stages: Vec<WaterfallStage>,

    // ===== 规则调整 (规范类型顺序) =====
    pub adjustments: Vec<AppliedAdjustment>,

    // ===== 取整 =====
    pub rounding_direction: RoundingDirection,

    // ===== 门店级调整 =====
    pub pre_store_pass_qty: f64,
    pub store_pass_reason: StorePassReason,
    pub store_grow_qty: f64,
    pub store_decline_qty: f64,

    // ===== 天气 =====
    pub pre_weather_qty: f64,
    pub weather_severity: f64,
    pub weather_category: SeverityCategory,
    pub weather_applied: bool,
    pub weather_reason: String,
    pub weather_adjustment_qty: f64,

    // ===== 异常 =====
    pub anomaly: bool,
    pub anomaly_stages: Vec<String>,
}

impl ForecastLine {
    /// 由输入记录构造预测行
    ///
    /// # 返回
    /// - `Err(DomainError::InvalidCasePack)`: 箱规缺失或为 0 (该行无法取整)
    pub fn from_input(input: ForecastLineInput) -> DomainResult<Self> {
        let case_pack = match input.case_pack {
            Some(cp) if cp > 0 => cp,
            other => {
                return Err(DomainError::InvalidCasePack {
                    store_no: input.store_no,
                    item_no: input.item_no,
                    date: input.date_forecast,
                    case_pack: other,
                })
            }
        };

        let history = SalesHistory::new(input.history.sold, input.history.shipped);
        let sold_out_last_week = input
            .sold_out_last_week
            .unwrap_or_else(|| history.was_sold_out_last_week());

        Ok(Self {
            region_code: input.region_code,
            store_no: input.store_no,
            item_no: input.item_no,
            date_forecast: input.date_forecast,
            history,
            case_pack,
            hero_item: input.hero_item,
            sold_out_last_week,
            baseline: BaselineSelection::default(),
            start_quantity: 0.0,
            quantity: 0.0,
            stages: Vec::new(),
            adjustments: Vec::new(),
            rounding_direction: RoundingDirection::None,
            pre_store_pass_qty: 0.0,
            store_pass_reason: StorePassReason::None,
            store_grow_qty: 0.0,
            store_decline_qty: 0.0,
            pre_weather_qty: 0.0,
            weather_severity: 0.0,
            weather_category: SeverityCategory::Minimal,
            weather_applied: false,
            weather_reason: String::new(),
            weather_adjustment_qty: 0.0,
            anomaly: false,
            anomaly_stages: Vec::new(),
        })
    }

    // ==========================================
    // 瀑布推进
    // ==========================================

    /// 设置瀑布起点 (基线阶段调用一次)
    pub fn start_waterfall(&mut self, start_quantity: f64) {
        let start = if start_quantity.is_finite() {
            start_quantity.max(0.0)
        } else {
            0.0
        };
        self.start_quantity = start;
        self.quantity = start;
        self.stages.clear();
    }

    /// 记录一个阶段并推进运行数量
    ///
    /// 结果为负时截断为 0 并标记异常; 返回实际生效的 delta
    pub fn apply_stage(&mut self, kind: StageKind, name: &str, delta: f64) -> f64 {
        self.apply_stage_inner(kind, name, delta, None)
    }

    /// 记录规则调整阶段 (阶段名 = 规则名)
    pub fn apply_adjustment_stage(
        &mut self,
        adjustment_type: AdjustmentType,
        name: &str,
        delta: f64,
    ) -> f64 {
        self.apply_stage_inner(StageKind::Adjustment, name, delta, Some(adjustment_type))
    }

    fn apply_stage_inner(
        &mut self,
        kind: StageKind,
        name: &str,
        delta: f64,
        adjustment_type: Option<AdjustmentType>,
    ) -> f64 {
        let before = self.quantity;
        let mut after = before + delta;

        if !after.is_finite() || after < -QTY_EPSILON {
            warn!(
                store_no = %self.store_no,
                item_no = %self.item_no,
                date = %self.date_forecast,
                stage = name,
                before = before,
                delta = delta,
                "阶段结果为负或非法,截断为 0 并标记异常"
            );
            self.anomaly = true;
            self.anomaly_stages.push(name.to_string());
            after = 0.0;
        } else if after < 0.0 {
            after = 0.0;
        }

        let applied = after - before;
        self.quantity = after;
        self.stages.push(WaterfallStage {
            kind,
            name: name.to_string(),
            delta: applied,
            adjustment_type,
        });
        applied
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn waterfall(&self) -> WaterfallRecord {
        WaterfallRecord {
            start_quantity: self.start_quantity,
            stages: self.stages.clone(),
            final_quantity: self.quantity,
        }
    }

    /// 某类阶段的 delta 合计
    pub fn stage_total(&self, kind: StageKind) -> f64 {
        self.stages
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.delta)
            .sum()
    }

    pub fn adjustment(&self, adjustment_type: AdjustmentType) -> Option<&AppliedAdjustment> {
        self.adjustments
            .iter()
            .find(|a| a.adjustment_type == adjustment_type)
    }

    pub fn final_units(&self) -> u64 {
        self.quantity.round().max(0.0) as u64
    }

    pub fn final_cases(&self) -> u64 {
        self.final_units() / u64::from(self.case_pack)
    }

    /// 当前箱数 (可为小数)
    pub fn current_cases(&self) -> f64 {
        self.quantity / f64::from(self.case_pack)
    }

    /// 预测覆盖 = 数量 / 基线; 基线为 0 时为 0
    pub fn coverage(&self) -> f64 {
        if self.baseline.baseline_qty > 0.0 {
            self.quantity / self.baseline.baseline_qty
        } else {
            0.0
        }
    }

    pub fn delta_from_last_week(&self) -> f64 {
        self.quantity - self.history.lw_shipped()
    }

    /// 分组键 (门店, 日期)
    pub fn store_key(&self) -> (String, NaiveDate) {
        (self.store_no.clone(), self.date_forecast)
    }
}
