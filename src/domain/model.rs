use crate::utils::error::Result;
use crate::utils::validation::{parse_date, validate_date_order};
use chrono::NaiveDate;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 單一實體（offer / affiliate / advertiser）在報表期間內的表現。
///
/// `profit` 與 `conversion_rate` 不存欄位，每次都由其他欄位重新計算。
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub id: String,
    pub offer_label: Option<String>,
    pub affiliate_label: Option<String>,
    pub advertiser_label: Option<String>,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
    pub payout: f64,
}

impl PerformanceRecord {
    /// affiliate → advertiser → offer → "unknown"
    pub fn display_name(&self) -> &str {
        self.affiliate_label
            .as_deref()
            .or(self.advertiser_label.as_deref())
            .or(self.offer_label.as_deref())
            .unwrap_or("unknown")
    }

    pub fn profit(&self) -> f64 {
        self.revenue - self.payout
    }

    pub fn conversion_rate(&self) -> f64 {
        conversion_rate(self.conversions, self.clicks)
    }
}

impl Serialize for PerformanceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PerformanceRecord", 11)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("offer", &self.offer_label)?;
        state.serialize_field("affiliate", &self.affiliate_label)?;
        state.serialize_field("advertiser", &self.advertiser_label)?;
        state.serialize_field("name", self.display_name())?;
        state.serialize_field("clicks", &self.clicks)?;
        state.serialize_field("conversions", &self.conversions)?;
        state.serialize_field("revenue", &self.revenue)?;
        state.serialize_field("payout", &self.payout)?;
        state.serialize_field("profit", &self.profit())?;
        state.serialize_field("conversion_rate", &self.conversion_rate())?;
        state.end()
    }
}

/// `conversions / clicks * 100`，四捨五入到小數第二位；沒有點擊時為 0
pub fn conversion_rate(conversions: u64, clicks: u64) -> f64 {
    if clicks == 0 {
        return 0.0;
    }
    round2(conversions as f64 / clicks as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub profit: f64,
    pub conversions: u64,
    pub clicks: u64,
}

impl Totals {
    pub fn from_records(records: &[PerformanceRecord]) -> Self {
        records.iter().fold(Self::default(), |acc, record| Self {
            profit: acc.profit + record.profit(),
            conversions: acc.conversions.saturating_add(record.conversions),
            clicks: acc.clicks.saturating_add(record.clicks),
        })
    }
}

/// 已正規化的紀錄與其總計；總計只在建構時算一次
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    records: Vec<PerformanceRecord>,
    totals: Totals,
}

impl Report {
    pub fn new(records: Vec<PerformanceRecord>) -> Self {
        let totals = Totals::from_records(&records);
        Self { records, totals }
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceShape {
    Table,
    ColumnsRows,
    Flat,
    Unrecognized,
}

impl SourceShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceShape::Table => "table",
            SourceShape::ColumnsRows => "columns_rows",
            SourceShape::Flat => "flat",
            SourceShape::Unrecognized => "unrecognized",
        }
    }

    /// 給前端顯示的資料來源標籤
    pub fn label(&self) -> &'static str {
        match self {
            SourceShape::Table => "Everflow API (table)",
            SourceShape::ColumnsRows => "Everflow API (columns/rows)",
            SourceShape::Flat => "Everflow API (flat)",
            SourceShape::Unrecognized => "Everflow API (unrecognized)",
        }
    }
}

/// 正規化結果；依辨識到的上游回應形狀分類
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedResult {
    Table(Report),
    ColumnsRows(Report),
    Flat(Vec<Value>),
    Unrecognized { message: String, raw: Value },
}

impl NormalizedResult {
    pub fn source_shape(&self) -> SourceShape {
        match self {
            NormalizedResult::Table(_) => SourceShape::Table,
            NormalizedResult::ColumnsRows(_) => SourceShape::ColumnsRows,
            NormalizedResult::Flat(_) => SourceShape::Flat,
            NormalizedResult::Unrecognized { .. } => SourceShape::Unrecognized,
        }
    }

    pub fn data_source(&self) -> &'static str {
        self.source_shape().label()
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            NormalizedResult::Table(report) | NormalizedResult::ColumnsRows(report) => {
                Some(report)
            }
            _ => None,
        }
    }

    /// 型別化紀錄；flat 與 unrecognized 沒有
    pub fn records(&self) -> &[PerformanceRecord] {
        self.report().map(Report::records).unwrap_or(&[])
    }

    pub fn totals(&self) -> Option<Totals> {
        self.report().map(Report::totals)
    }

    pub fn count(&self) -> usize {
        match self {
            NormalizedResult::Table(report) | NormalizedResult::ColumnsRows(report) => {
                report.records().len()
            }
            NormalizedResult::Flat(items) => items.len(),
            NormalizedResult::Unrecognized { .. } => 0,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, NormalizedResult::Unrecognized { .. })
    }
}

impl Serialize for NormalizedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NormalizedResult::Table(report) | NormalizedResult::ColumnsRows(report) => {
                let totals = report.totals();
                let mut map = serializer.serialize_map(Some(6))?;
                map.serialize_entry("data", report.records())?;
                map.serialize_entry("total_profit", &totals.profit)?;
                map.serialize_entry("total_conversions", &totals.conversions)?;
                map.serialize_entry("total_clicks", &totals.clicks)?;
                map.serialize_entry("count", &report.records().len())?;
                map.serialize_entry("data_source", self.data_source())?;
                map.end()
            }
            NormalizedResult::Flat(items) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("data", items)?;
                map.serialize_entry("count", &items.len())?;
                map.serialize_entry("data_source", self.data_source())?;
                map.end()
            }
            NormalizedResult::Unrecognized { message, raw } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("error", &true)?;
                map.serialize_entry("message", message)?;
                map.serialize_entry("raw", raw)?;
                map.serialize_entry("data_source", self.data_source())?;
                map.end()
            }
        }
    }
}

/// 已驗證的日期區間，保證 `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        validate_date_order(start, end)?;
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn from_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn to_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Everflow entity table 報表的主要分組實體
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Offer,
    Affiliate,
    Advertiser,
}

impl EntityKind {
    /// 送給 entity table 的欄位分組，第一個為主實體
    pub fn columns(&self) -> [&'static str; 2] {
        match self {
            EntityKind::Offer => ["offer", "affiliate"],
            EntityKind::Affiliate => ["affiliate", "offer"],
            EntityKind::Advertiser => ["advertiser", "offer"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Offer => "offer",
            EntityKind::Affiliate => "affiliate",
            EntityKind::Advertiser => "advertiser",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(clicks: u64, conversions: u64, revenue: f64, payout: f64) -> PerformanceRecord {
        PerformanceRecord {
            id: "1".to_string(),
            offer_label: Some("Offer".to_string()),
            affiliate_label: None,
            advertiser_label: None,
            clicks,
            conversions,
            revenue,
            payout,
        }
    }

    #[test]
    fn test_conversion_rate_rounding() {
        assert_eq!(conversion_rate(0, 0), 0.0);
        assert_eq!(conversion_rate(5, 0), 0.0);
        assert_eq!(conversion_rate(5, 100), 5.0);
        assert_eq!(conversion_rate(1, 3), 33.33);
        assert_eq!(conversion_rate(2, 3), 66.67);
    }

    #[test]
    fn test_display_name_priority() {
        let mut r = record(0, 0, 0.0, 0.0);
        assert_eq!(r.display_name(), "Offer");
        r.advertiser_label = Some("Adv".to_string());
        assert_eq!(r.display_name(), "Adv");
        r.affiliate_label = Some("Aff".to_string());
        assert_eq!(r.display_name(), "Aff");
        r.offer_label = None;
        r.advertiser_label = None;
        r.affiliate_label = None;
        assert_eq!(r.display_name(), "unknown");
    }

    #[test]
    fn test_record_serializes_derived_fields() {
        let value = serde_json::to_value(record(100, 5, 50.0, 10.0)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1",
                "offer": "Offer",
                "affiliate": null,
                "advertiser": null,
                "name": "Offer",
                "clicks": 100,
                "conversions": 5,
                "revenue": 50.0,
                "payout": 10.0,
                "profit": 40.0,
                "conversion_rate": 5.0
            })
        );
    }

    #[test]
    fn test_report_totals() {
        let report = Report::new(vec![record(10, 1, 5.0, 2.0), record(20, 3, 1.5, 4.0)]);
        let totals = report.totals();
        assert_eq!(totals.clicks, 30);
        assert_eq!(totals.conversions, 4);
        assert_eq!(totals.profit, 0.5);
    }

    #[test]
    fn test_totals_saturate_at_max() {
        let totals = Totals::from_records(&[
            record(u64::MAX, u64::MAX, 0.0, 0.0),
            record(1, 1, 0.0, 0.0),
        ]);
        assert_eq!(totals.clicks, u64::MAX);
        assert_eq!(totals.conversions, u64::MAX);
    }

    #[test]
    fn test_unrecognized_serialization() {
        let result = NormalizedResult::Unrecognized {
            message: "nope".to_string(),
            raw: json!({"x": 1}),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["error"], json!(true));
        assert_eq!(value["raw"], json!({"x": 1}));
        assert_eq!(value["data_source"], json!("Everflow API (unrecognized)"));
        assert_eq!(result.count(), 0);
        assert!(result.totals().is_none());
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        assert_eq!(range.from_param(), "2024-01-01");
        assert_eq!(range.to_param(), "2024-01-31");
        assert!(DateRange::parse("2024-02-01", "2024-01-31").is_err());
        assert!(DateRange::parse("yesterday", "2024-01-31").is_err());
    }

    #[test]
    fn test_entity_columns() {
        assert_eq!(EntityKind::Offer.columns(), ["offer", "affiliate"]);
        assert_eq!(EntityKind::Affiliate.columns(), ["affiliate", "offer"]);
        assert_eq!(EntityKind::Advertiser.columns(), ["advertiser", "offer"]);
    }
}
