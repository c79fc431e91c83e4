// ==========================================
// 门店订货预测系统 - 规则匹配器
// ==========================================
// 职责: 按类型在规则库中查找首个命中规则
// 红线: 同类型首个命中即返回 (first match wins)
// 红线: 结果只依赖 (行标识, 日期, 规则顺序),与处理顺序无关
// ==========================================

use crate::domain::adjustment::{AdjustmentRegistry, AdjustmentRule};
use crate::domain::types::AdjustmentType;
use chrono::NaiveDate;

/// 匹配键: 行标识 + 生效日期
#[derive(Debug, Clone, Copy)]
pub struct MatchKey<'a> {
    pub region_code: &'a str,
    pub store_no: &'a str,
    pub item_no: &'a str,
    pub as_of_date: NaiveDate,
}

pub struct RuleMatcher {}

impl RuleMatcher {
    pub fn new() -> Self {
        Self {}
    }

    /// 指定类型的首个命中规则
    pub fn find_match<'r>(
        &self,
        registry: &'r AdjustmentRegistry,
        adjustment_type: AdjustmentType,
        key: &MatchKey<'_>,
    ) -> Option<&'r AdjustmentRule> {
        registry
            .rules_of(adjustment_type)
            .iter()
            .find(|rule| self.matches(rule, key))
    }

    /// 按规范顺序返回每个类型的命中结果
    pub fn match_all<'r>(
        &self,
        registry: &'r AdjustmentRegistry,
        key: &MatchKey<'_>,
    ) -> [Option<&'r AdjustmentRule>; 8] {
        AdjustmentType::ALL.map(|t| self.find_match(registry, t, key))
    }

    pub fn matches(&self, rule: &AdjustmentRule, key: &MatchKey<'_>) -> bool {
        rule.is_active_on(key.as_of_date)
            && rule.matches_scope(key.region_code, key.store_no, key.item_no)
    }
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn rule(name: &str, regions: Option<&[&str]>, start: u32, end: u32) -> AdjustmentRule {
        AdjustmentRule {
            adjustment_type: AdjustmentType::Promo,
            name: name.to_string(),
            regions: regions.map(|r| r.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()),
            stores: None,
            items: None,
            start_date: date(start),
            end_date: date(end),
            multiplier: 1.1,
        }
    }

    fn key(region: &'static str, d: u32) -> MatchKey<'static> {
        MatchKey {
            region_code: region,
            store_no: "101",
            item_no: "5001",
            as_of_date: date(d),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let registry = AdjustmentRegistry::new(vec![
            rule("First", Some(&["BA"]), 1, 10),
            rule("Second", None, 1, 10),
        ]);
        let matcher = RuleMatcher::new();

        let hit = matcher.find_match(&registry, AdjustmentType::Promo, &key("BA", 5));
        assert_eq!(hit.map(|r| r.name.as_str()), Some("First"));

        let hit = matcher.find_match(&registry, AdjustmentType::Promo, &key("LA", 5));
        assert_eq!(hit.map(|r| r.name.as_str()), Some("Second"));
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let registry = AdjustmentRegistry::new(vec![rule("Week", None, 1, 7)]);
        let matcher = RuleMatcher::new();

        assert!(matcher.find_match(&registry, AdjustmentType::Promo, &key("BA", 1)).is_some());
        assert!(matcher.find_match(&registry, AdjustmentType::Promo, &key("BA", 7)).is_some());
        assert!(matcher.find_match(&registry, AdjustmentType::Promo, &key("BA", 8)).is_none());
    }

    #[test]
    fn test_match_all_only_fills_configured_types() {
        let registry = AdjustmentRegistry::new(vec![rule("Promo", None, 1, 7)]);
        let hits = RuleMatcher::new().match_all(&registry, &key("BA", 3));

        assert!(hits[AdjustmentType::Promo.index()].is_some());
        assert_eq!(hits.iter().filter(|h| h.is_some()).count(), 1);
    }
}
