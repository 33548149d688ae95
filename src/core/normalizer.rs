//! Normalizes Everflow reporting responses into [`PerformanceRecord`]s.
//!
//! Everflow answers reporting calls in one of three shapes:
//!
//! - **table**: `{"table": [{"columns": [...], "reporting": {...}}, ...]}`
//! - **columns/rows**: `{"data": {"columns": [{"name": ..}], "rows": [[..], ..]}}`
//! - **flat**: `{"data": [...]}`, passed through untouched
//!
//! Detection runs in that order and the first structural match wins. Anything
//! else comes back as [`NormalizedResult::Unrecognized`] with the raw payload.
//!
//! The two typed shapes treat bad rows differently. A table row that fails to
//! decode is logged and dropped while the rest of the table is kept; a bad
//! columns/rows row fails the whole response.

use crate::core::coerce::{amount_field, count_field, to_amount, to_count, to_identifier};
use crate::domain::model::{NormalizedResult, PerformanceRecord, Report};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

const UNRECOGNIZED_MESSAGE: &str = "unrecognized Everflow response format";

/// 上游回應的結構分類，只做結構判斷不解析內容
#[derive(Debug)]
enum UpstreamShape<'a> {
    Table(&'a [Value]),
    ColumnsRows { columns: &'a Value, rows: &'a Value },
    Flat(&'a [Value]),
    Opaque,
}

impl<'a> UpstreamShape<'a> {
    fn detect(raw: &'a Value) -> Self {
        if let Some(rows) = raw.get("table").and_then(Value::as_array) {
            return UpstreamShape::Table(rows);
        }

        let data = raw.get("data");

        if let Some(data) = data {
            let columns = data.get("columns").filter(|v| !v.is_null());
            let rows = data.get("rows").filter(|v| !v.is_null());
            if let (Some(columns), Some(rows)) = (columns, rows) {
                return UpstreamShape::ColumnsRows { columns, rows };
            }
        }

        if let Some(items) = data.and_then(Value::as_array) {
            return UpstreamShape::Flat(items);
        }

        UpstreamShape::Opaque
    }
}

/// 將上游 JSON 正規化；不會失敗，無法辨識時回傳 `Unrecognized`
pub fn normalize(raw: &Value) -> NormalizedResult {
    tracing::debug!("📥 Everflow raw response: {}", raw);

    match UpstreamShape::detect(raw) {
        UpstreamShape::Table(rows) => {
            tracing::info!("🔍 Table structure detected ({} rows)", rows.len());
            let report = normalize_table(rows);
            tracing::info!("✅ Parsed {} records from table", report.records().len());
            NormalizedResult::Table(report)
        }
        UpstreamShape::ColumnsRows { columns, rows } => {
            tracing::info!("🔍 Columns/rows structure detected");
            match normalize_columns_rows(columns, rows) {
                Ok(report) => {
                    tracing::info!(
                        "✅ Parsed {} records from columns/rows",
                        report.records().len()
                    );
                    NormalizedResult::ColumnsRows(report)
                }
                Err(e) => {
                    tracing::error!("❌ Failed to parse columns/rows response: {}", e);
                    NormalizedResult::Unrecognized {
                        message: format!("parse error: {}", e),
                        raw: raw.clone(),
                    }
                }
            }
        }
        UpstreamShape::Flat(items) => {
            tracing::info!("🔍 Flat data structure detected ({} items)", items.len());
            NormalizedResult::Flat(items.to_vec())
        }
        UpstreamShape::Opaque => {
            tracing::warn!("⚠️ Unrecognized Everflow response format: {}", raw);
            NormalizedResult::Unrecognized {
                message: UNRECOGNIZED_MESSAGE.to_string(),
                raw: raw.clone(),
            }
        }
    }
}

// ---- table shape ----

#[derive(Debug, Deserialize)]
struct TableRow {
    columns: Vec<ColumnEntry>,
    // 空的 reporting 可能以 `[]` 出現，非物件一律視為沒有指標
    reporting: Value,
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    column_type: Option<Value>,
    id: Option<Value>,
    label: Option<Value>,
}

impl ColumnEntry {
    fn id(&self) -> Option<String> {
        to_identifier(self.id.as_ref())
    }

    fn label(&self) -> Option<String> {
        to_identifier(self.label.as_ref())
    }
}

fn normalize_table(rows: &[Value]) -> Report {
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        if has_field(row, "columns") && has_field(row, "reporting") {
            match TableRow::deserialize(row) {
                Ok(parsed) => records.push(table_record(index, parsed)),
                Err(e) => {
                    tracing::error!("❌ Dropping table row {}: {} (row: {})", index, e, row);
                }
            }
        } else if is_legacy_row(row) {
            // 舊版純表格格式：第一列是表頭，其餘目前只記錄不轉換
            if index == 0 {
                tracing::debug!("Skipping legacy header row");
                continue;
            }
            tracing::info!("📄 Legacy tabular row {} detected, not converted: {}", index, row);
        } else {
            tracing::debug!("Skipping table row {} without columns/reporting", index);
        }
    }

    Report::new(records)
}

fn has_field(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(|v| !v.is_null())
}

fn is_legacy_row(row: &Value) -> bool {
    match row {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty() && !has_field(row, "columns"),
        _ => false,
    }
}

fn table_record(index: usize, row: TableRow) -> PerformanceRecord {
    let mut offer: Option<ColumnEntry> = None;
    let mut affiliate: Option<ColumnEntry> = None;
    let mut advertiser: Option<ColumnEntry> = None;

    // 同一列有重複 column_type 時以最後一個為準
    for column in row.columns {
        match column.column_type.as_ref().and_then(Value::as_str) {
            Some("offer") => offer = Some(column),
            Some("affiliate") => affiliate = Some(column),
            Some("advertiser") => advertiser = Some(column),
            _ => {}
        }
    }

    let id = [&offer, &affiliate, &advertiser]
        .into_iter()
        .find_map(|entry| entry.as_ref().and_then(ColumnEntry::id))
        .unwrap_or_else(|| format!("row_{}", index));

    let empty = Map::new();
    let reporting = row.reporting.as_object().unwrap_or(&empty);

    PerformanceRecord {
        id,
        offer_label: offer.as_ref().and_then(ColumnEntry::label),
        affiliate_label: affiliate.as_ref().and_then(ColumnEntry::label),
        advertiser_label: advertiser.as_ref().and_then(ColumnEntry::label),
        clicks: count_field(reporting, "total_click"),
        conversions: count_field(reporting, "total_cv"),
        revenue: amount_field(reporting, "revenue"),
        payout: amount_field(reporting, "payout"),
    }
}

// ---- columns/rows shape ----

#[derive(Debug, Error)]
pub enum ColumnsRowsError {
    #[error("invalid columns/rows payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("row {index} has {actual} values but {expected} columns are declared")]
    RowWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Deserialize)]
struct NamedColumn {
    name: String,
}

fn normalize_columns_rows(
    columns: &Value,
    rows: &Value,
) -> std::result::Result<Report, ColumnsRowsError> {
    let columns = Vec::<NamedColumn>::deserialize(columns)?;
    let rows = Vec::<Vec<Value>>::deserialize(rows)?;

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        if row.len() != names.len() {
            return Err(ColumnsRowsError::RowWidth {
                index,
                expected: names.len(),
                actual: row.len(),
            });
        }

        let fields: HashMap<&str, &Value> = names.iter().copied().zip(row.iter()).collect();
        records.push(columns_rows_record(&fields));
    }

    Ok(Report::new(records))
}

fn columns_rows_record(fields: &HashMap<&str, &Value>) -> PerformanceRecord {
    let field = |key: &str| fields.get(key).copied();
    let count = |key: &str| to_count(field(key));
    let amount = |key: &str| to_amount(field(key));

    let id = to_identifier(field("offer_id"))
        .or_else(|| to_identifier(field("affiliate_id")))
        .unwrap_or_else(|| "unknown".to_string());

    PerformanceRecord {
        id,
        offer_label: to_identifier(field("offer_name")),
        affiliate_label: to_identifier(field("affiliate_name")),
        advertiser_label: None,
        clicks: count("clicks"),
        conversions: count("conversions"),
        revenue: amount("revenue"),
        payout: amount("payout"),
    }
}
