use crate::domain::model::{
    conversion_rate, round2, DateRange, NormalizedResult, PerformanceRecord,
};
use serde::Serialize;

pub const TOP_PERFORMERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub success: bool,
    pub period: Period,
    pub summary: SummaryTotals,
    pub top_performers: TopPerformers,
    pub data_sources: DataSources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub total_profit: f64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub total_revenue: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformers {
    pub offers: Vec<PerformanceRecord>,
    pub affiliates: Vec<PerformanceRecord>,
    pub advertisers: Vec<PerformanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSources {
    pub offers: &'static str,
    pub affiliates: &'static str,
    pub advertisers: &'static str,
}

impl DashboardSummary {
    /// 總計只看 offer 報表，金額在這裡才四捨五入給前端顯示
    pub fn build(
        range: &DateRange,
        offers: &NormalizedResult,
        affiliates: &NormalizedResult,
        advertisers: &NormalizedResult,
    ) -> Self {
        let offer_records = offers.records();

        let mut total_profit = 0.0;
        let mut total_revenue = 0.0;
        let mut total_clicks: u64 = 0;
        let mut total_conversions: u64 = 0;
        for record in offer_records {
            total_profit += record.profit();
            total_revenue += record.revenue;
            total_clicks = total_clicks.saturating_add(record.clicks);
            total_conversions = total_conversions.saturating_add(record.conversions);
        }

        Self {
            success: true,
            period: Period {
                start_date: range.from_param(),
                end_date: range.to_param(),
            },
            summary: SummaryTotals {
                total_profit: round2(total_profit),
                total_clicks,
                total_conversions,
                total_revenue: round2(total_revenue),
                conversion_rate: conversion_rate(total_conversions, total_clicks),
            },
            top_performers: TopPerformers {
                offers: top_by_profit(offer_records, TOP_PERFORMERS),
                affiliates: top_by_profit(affiliates.records(), TOP_PERFORMERS),
                advertisers: top_by_profit(advertisers.records(), TOP_PERFORMERS),
            },
            data_sources: DataSources {
                offers: offers.data_source(),
                affiliates: affiliates.data_source(),
                advertisers: advertisers.data_source(),
            },
        }
    }
}

/// 依 profit 由高到低取前 `limit` 筆；profit 相同時維持原順序
pub fn top_by_profit(records: &[PerformanceRecord], limit: usize) -> Vec<PerformanceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.profit().total_cmp(&a.profit()));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Report;
    use serde_json::json;

    fn record(id: &str, clicks: u64, conversions: u64, revenue: f64, payout: f64) -> PerformanceRecord {
        PerformanceRecord {
            id: id.to_string(),
            offer_label: Some(format!("Offer {}", id)),
            affiliate_label: None,
            advertiser_label: None,
            clicks,
            conversions,
            revenue,
            payout,
        }
    }

    #[test]
    fn test_top_by_profit_orders_and_truncates() {
        let records: Vec<PerformanceRecord> = (0..7)
            .map(|i| record(&i.to_string(), 1, 0, i as f64 * 10.0, 0.0))
            .collect();

        let top = top_by_profit(&records, 5);
        let ids: Vec<&str> = top.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["6", "5", "4", "3", "2"]);
    }

    #[test]
    fn test_top_by_profit_is_stable_for_ties() {
        let records = vec![
            record("a", 0, 0, 5.0, 0.0),
            record("b", 0, 0, 5.0, 0.0),
            record("c", 0, 0, 9.0, 0.0),
        ];
        let ids: Vec<String> = top_by_profit(&records, 5).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_build_summary_saturates_counts() {
        let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
        let offers = NormalizedResult::Table(Report::new(vec![
            record("1", u64::MAX, u64::MAX, 1.0, 0.0),
            record("2", 5, 5, 1.0, 0.0),
        ]));
        let empty = NormalizedResult::Flat(Vec::new());

        let summary = DashboardSummary::build(&range, &offers, &empty, &empty);

        assert_eq!(summary.summary.total_clicks, u64::MAX);
        assert_eq!(summary.summary.total_conversions, u64::MAX);
        assert_eq!(summary.summary.conversion_rate, 100.0);
    }

    #[test]
    fn test_build_summary() {
        let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
        let offers = NormalizedResult::Table(Report::new(vec![
            record("1", 200, 3, 10.004, 2.0),
            record("2", 100, 6, 20.0, 5.0),
        ]));
        let affiliates = NormalizedResult::Flat(vec![json!({"profit": 1000})]);
        let advertisers = NormalizedResult::Unrecognized {
            message: "unrecognized".to_string(),
            raw: json!({}),
        };

        let summary = DashboardSummary::build(&range, &offers, &affiliates, &advertisers);

        assert!(summary.success);
        assert_eq!(summary.period.start_date, "2024-03-01");
        assert_eq!(summary.summary.total_clicks, 300);
        assert_eq!(summary.summary.total_conversions, 9);
        assert_eq!(summary.summary.total_revenue, 30.0);
        assert_eq!(summary.summary.total_profit, 23.0);
        assert_eq!(summary.summary.conversion_rate, 3.0);

        assert_eq!(summary.top_performers.offers[0].id, "2");
        assert!(summary.top_performers.affiliates.is_empty());
        assert!(summary.top_performers.advertisers.is_empty());

        assert_eq!(summary.data_sources.offers, "Everflow API (table)");
        assert_eq!(summary.data_sources.affiliates, "Everflow API (flat)");
        assert_eq!(summary.data_sources.advertisers, "Everflow API (unrecognized)");
    }
}
