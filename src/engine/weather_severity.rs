// ==========================================
// 门店订货预测系统 - 天气严重度评分器
// ==========================================
// 职责: 天气观测 → 0-10 综合严重度 + 等级 + 主导因素
// 红线: 输出恒在 [0, 10] 内,输入先做越界截断
// 红线: 各项加成独立封顶,仅在 base >= 2 时叠加
// ==========================================
// 分项:
//   rain  : 有效降雨 = 降雨量 × 概率/100, 分段 0.1/0.25/0.5/1.0 英寸
//   snow  : 新雪 + 积雪加成, 分段 1/3/6/12 英寸
//   wind  : max(风速, 阵风×0.8), 分段 15/25/40/58 mph
//   vis   : 能见度, 分段 10/5/1/0.25 英里
//   storm : 强对流风险 30/50/70
// ==========================================

use crate::domain::types::SeverityCategory;
use crate::domain::weather::{WeatherObservation, WeatherSeverity};

/// 叠加加成的 base 门槛
const BONUS_BASE_MIN: f64 = 2.0;
const ICE_BONUS: f64 = 2.0;
const MAX_SCORE: f64 = 10.0;

pub struct WeatherSeverityScorer {}

impl WeatherSeverityScorer {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 综合评分; 无观测返回 0
    pub fn score(&self, observation: Option<&WeatherObservation>) -> WeatherSeverity {
        let Some(obs) = observation else {
            return WeatherSeverity::none();
        };

        let rain_amount = clamp_non_negative(obs.rain_amount);
        let rain_probability = clamp_percent(obs.rain_probability);
        let snow_amount = clamp_non_negative(obs.snow_amount);
        let snow_depth = clamp_non_negative(obs.snow_depth);
        let wind_speed = clamp_non_negative(obs.wind_speed);
        let wind_gust = obs.wind_gust.map(clamp_non_negative);
        let visibility = obs.visibility.map(clamp_non_negative);
        let storm_risk = clamp_percent(obs.storm_risk);
        let coverage = obs.precip_coverage.map(clamp_percent).unwrap_or(0.0);

        let rain = rain_score(rain_amount, rain_probability);
        let snow = snow_score(snow_amount, snow_depth);
        let wind = wind_score(wind_speed, wind_gust);
        let vis = visibility_score(visibility);
        let storm = storm_score(storm_risk);

        let base = rain.max(snow).max(storm);

        let mut bonus = 0.0;
        if base >= BONUS_BASE_MIN {
            if wind >= 2.0 {
                bonus += (wind * 0.25).min(1.5);
            }
            if vis >= 2.0 {
                bonus += (vis * 0.25).min(1.5);
            }
            if snow > rain {
                bonus += (snow * 0.25).min(2.0);
            }
            if storm >= 3.0 {
                bonus += (storm * 0.2).min(1.5);
            }
            bonus += coverage_bonus(base, coverage);
            if obs.ice {
                bonus += ICE_BONUS;
            }
        }

        let score = round2((base + bonus).clamp(0.0, MAX_SCORE));

        WeatherSeverity {
            score,
            category: SeverityCategory::from_score(score),
            rain_score: round2(rain),
            snow_score: round2(snow),
            wind_score: round2(wind),
            visibility_score: round2(vis),
            storm_score: round2(storm),
            base_score: round2(base),
            bonus: round2(bonus),
            driver: describe_driver(rain, snow, storm, wind, vis, snow_depth, obs.ice, base),
        }
    }
}

impl Default for WeatherSeverityScorer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 分项评分
// ==========================================

/// 分段线性: 阈值 t[0..4] 对应分值区间 [0,a) [a,b) [b,c) [c,10)
fn banded(value: f64, thresholds: [f64; 4], scores: [f64; 4]) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    if value >= thresholds[3] {
        return MAX_SCORE;
    }
    let mut lower_t = 0.0;
    let mut lower_s = 0.0;
    for (t, s) in thresholds.iter().zip(scores.iter()) {
        if value < *t {
            return lower_s + (s - lower_s) * (value - lower_t) / (t - lower_t);
        }
        lower_t = *t;
        lower_s = *s;
    }
    MAX_SCORE
}

pub fn rain_score(amount: f64, probability: f64) -> f64 {
    let effective = amount * probability / 100.0;
    banded(effective, [0.1, 0.25, 0.5, 1.0], [2.0, 4.0, 7.0, 10.0])
}

/// 积雪加成 (英寸 → 等效新雪)
pub fn snow_depth_bonus(depth: f64) -> f64 {
    if depth >= 12.0 {
        4.0
    } else if depth >= 8.0 {
        3.0
    } else if depth >= 4.0 {
        2.0
    } else if depth >= 2.0 {
        1.0
    } else {
        depth * 0.5
    }
}

pub fn snow_score(amount: f64, depth: f64) -> f64 {
    if amount <= 0.0 && depth <= 0.0 {
        return 0.0;
    }
    let total = amount + snow_depth_bonus(depth);
    banded(total, [1.0, 3.0, 6.0, 12.0], [2.0, 4.0, 7.0, 10.0])
}

pub fn wind_score(speed: f64, gust: Option<f64>) -> f64 {
    let effective = speed.max(gust.map_or(0.0, |g| g * 0.8));
    banded(effective, [15.0, 25.0, 40.0, 58.0], [1.0, 3.0, 6.0, 10.0])
}

pub fn visibility_score(visibility: Option<f64>) -> f64 {
    let Some(v) = visibility else {
        return 0.0;
    };
    if v >= 10.0 {
        0.0
    } else if v <= 0.25 {
        8.0 + 2.0 * (0.25 - v) / 0.25
    } else if v <= 1.0 {
        5.0 + 3.0 * (1.0 - v) / 0.75
    } else if v <= 5.0 {
        2.0 + 3.0 * (5.0 - v) / 4.0
    } else {
        2.0 * (10.0 - v) / 5.0
    }
}

pub fn storm_score(risk: f64) -> f64 {
    if risk >= 70.0 {
        8.0 + (risk - 70.0) / 30.0 * 2.0
    } else if risk >= 50.0 {
        5.0 + (risk - 50.0) / 20.0 * 3.0
    } else if risk >= 30.0 {
        2.0 + (risk - 30.0) / 20.0 * 3.0
    } else {
        0.0
    }
}

/// 全天降水覆盖率加成
fn coverage_bonus(base: f64, coverage: f64) -> f64 {
    if coverage >= 75.0 {
        (base * 0.20).min(1.5)
    } else if coverage >= 50.0 {
        (base * 0.15).min(1.0)
    } else if coverage >= 25.0 {
        (base * 0.10).min(0.5)
    } else {
        0.0
    }
}

#[allow(clippy::too_many_arguments)]
fn describe_driver(
    rain: f64,
    snow: f64,
    storm: f64,
    wind: f64,
    vis: f64,
    depth: f64,
    ice: bool,
    base: f64,
) -> String {
    if base <= 0.0 && wind <= 0.0 && vis <= 0.0 {
        return "clear".to_string();
    }

    let candidates = [
        (snow, if depth >= 2.0 { "heavy snow + depth" } else { "heavy snow" }),
        (rain, "heavy rain"),
        (storm, "storm risk"),
        (wind, "high wind"),
        (vis, "low visibility"),
    ];
    let mut driver = candidates
        .iter()
        .fold((f64::MIN, ""), |best, (s, label)| {
            if *s > best.0 {
                (*s, *label)
            } else {
                best
            }
        })
        .1
        .to_string();

    if ice && base >= BONUS_BASE_MIN {
        driver.push_str(" + ice");
    }
    driver
}

fn clamp_non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
