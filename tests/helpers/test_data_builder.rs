// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use store_order_forecast::domain::{ForecastLineInput, RawAdjustmentRule, SalesHistory, WeatherObservation};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

// ==========================================
// ForecastLineInput 构建器
// ==========================================

pub struct LineBuilder {
    region_code: String,
    store_no: String,
    item_no: String,
    date_forecast: NaiveDate,
    sold: [f64; 4],
    shipped: [f64; 4],
    case_pack: Option<u32>,
    hero_item: bool,
    sold_out_last_week: Option<bool>,
}

impl LineBuilder {
    pub fn new(store_no: &str, item_no: &str) -> Self {
        Self {
            region_code: "BA".to_string(),
            store_no: store_no.to_string(),
            item_no: item_no.to_string(),
            date_forecast: date(2026, 7, 3),
            sold: [100.0, 90.0, 90.0, 90.0],
            shipped: [110.0; 4],
            case_pack: Some(10),
            hero_item: false,
            sold_out_last_week: None,
        }
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region_code = region.to_string();
        self
    }

    pub fn on(mut self, d: NaiveDate) -> Self {
        self.date_forecast = d;
        self
    }

    /// 最近周在前
    pub fn sold(mut self, sold: [f64; 4]) -> Self {
        self.sold = sold;
        self
    }

    /// 最近周在前
    pub fn shipped(mut self, shipped: [f64; 4]) -> Self {
        self.shipped = shipped;
        self
    }

    pub fn case_pack(mut self, case_pack: u32) -> Self {
        self.case_pack = Some(case_pack);
        self
    }

    pub fn no_case_pack(mut self) -> Self {
        self.case_pack = None;
        self
    }

    pub fn hero(mut self) -> Self {
        self.hero_item = true;
        self
    }

    pub fn sold_out(mut self, flag: bool) -> Self {
        self.sold_out_last_week = Some(flag);
        self
    }

    pub fn build(self) -> ForecastLineInput {
        ForecastLineInput {
            region_code: self.region_code,
            store_no: self.store_no,
            item_no: self.item_no,
            date_forecast: self.date_forecast,
            history: SalesHistory::new(self.sold, self.shipped),
            case_pack: self.case_pack,
            hero_item: self.hero_item,
            sold_out_last_week: self.sold_out_last_week,
        }
    }
}

// ==========================================
// RawAdjustmentRule 构建器
// ==========================================

pub struct RuleBuilder {
    raw: RawAdjustmentRule,
}

impl RuleBuilder {
    pub fn new(adjustment_type: &str, name: &str) -> Self {
        Self {
            raw: RawAdjustmentRule {
                adjustment_type: Some(adjustment_type.to_string()),
                name: Some(name.to_string()),
                regions: None,
                stores: None,
                items: None,
                start_date: Some(date(2026, 7, 1)),
                end_date: Some(date(2026, 7, 7)),
                multiplier: Some(1.0),
            },
        }
    }

    pub fn regions(mut self, regions: &[&str]) -> Self {
        self.raw.regions = Some(regions.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn stores(mut self, stores: &[&str]) -> Self {
        self.raw.stores = Some(stores.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn items(mut self, items: &[&str]) -> Self {
        self.raw.items = Some(items.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.raw.start_date = Some(start);
        self.raw.end_date = Some(end);
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.raw.multiplier = Some(multiplier);
        self
    }

    pub fn build(self) -> RawAdjustmentRule {
        self.raw
    }
}

// ==========================================
// WeatherObservation 构建器
// ==========================================

pub struct WeatherBuilder {
    obs: WeatherObservation,
}

impl WeatherBuilder {
    pub fn new(store_no: &str, d: NaiveDate) -> Self {
        Self {
            obs: WeatherObservation::new(store_no, d),
        }
    }

    pub fn rain(mut self, amount: f64, probability: f64) -> Self {
        self.obs.rain_amount = amount;
        self.obs.rain_probability = probability;
        self
    }

    pub fn snow(mut self, amount: f64, depth: f64) -> Self {
        self.obs.snow_amount = amount;
        self.obs.snow_depth = depth;
        self
    }

    pub fn wind(mut self, speed: f64, gust: Option<f64>) -> Self {
        self.obs.wind_speed = speed;
        self.obs.wind_gust = gust;
        self
    }

    pub fn visibility(mut self, miles: f64) -> Self {
        self.obs.visibility = Some(miles);
        self
    }

    pub fn storm_risk(mut self, risk: f64) -> Self {
        self.obs.storm_risk = risk;
        self
    }

    pub fn coverage(mut self, pct: f64) -> Self {
        self.obs.precip_coverage = Some(pct);
        self
    }

    pub fn ice(mut self) -> Self {
        self.obs.ice = true;
        self
    }

    pub fn build(self) -> WeatherObservation {
        self.obs
    }
}
