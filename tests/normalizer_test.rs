use everflow_dash::{normalize, NormalizedResult, SourceShape};
use serde_json::json;

#[test]
fn test_table_single_offer_row() {
    let raw = json!({"table": [{
        "columns": [{"column_type": "offer", "id": "42", "label": "Offer A"}],
        "reporting": {"total_click": 100, "total_cv": 5, "revenue": 50.0, "payout": 10.0}
    }]});

    let result = normalize(&raw);
    assert_eq!(result.source_shape(), SourceShape::Table);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        json!({
            "data": [{
                "id": "42",
                "offer": "Offer A",
                "affiliate": null,
                "advertiser": null,
                "name": "Offer A",
                "clicks": 100,
                "conversions": 5,
                "revenue": 50.0,
                "payout": 10.0,
                "profit": 40.0,
                "conversion_rate": 5.0
            }],
            "total_profit": 40.0,
            "total_conversions": 5,
            "total_clicks": 100,
            "count": 1,
            "data_source": "Everflow API (table)"
        })
    );
}

#[test]
fn test_table_malformed_row_excluded_from_totals() {
    let raw = json!({"table": [
        {
            "columns": [
                {"column_type": "offer", "id": "1", "label": "Offer"},
                {"column_type": "affiliate", "id": "10", "label": "Partner"}
            ],
            "reporting": {"total_click": 50, "total_cv": 10, "revenue": 100.0, "payout": 60.0}
        },
        {
            "columns": [{"column_type": "offer", "id": "2", "label": "Broken"}]
        }
    ]});

    let result = normalize(&raw);
    assert_eq!(result.count(), 1);

    let record = &result.records()[0];
    assert_eq!(record.id, "1");
    assert_eq!(record.display_name(), "Partner");
    assert_eq!(record.conversion_rate(), 20.0);

    let totals = result.totals().unwrap();
    assert_eq!(totals.clicks, 50);
    assert_eq!(totals.conversions, 10);
    assert_eq!(totals.profit, 40.0);
}

#[test]
fn test_columns_rows_defaults_missing_fields() {
    let raw = json!({"data": {"columns": [{"name": "offer_id"}, {"name": "clicks"}], "rows": [["7", 3]]}});

    let result = normalize(&raw);
    assert_eq!(result.source_shape(), SourceShape::ColumnsRows);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["data"][0]["id"], json!("7"));
    assert_eq!(value["data"][0]["clicks"], json!(3));
    assert_eq!(value["data"][0]["conversions"], json!(0));
    assert_eq!(value["data"][0]["revenue"], json!(0.0));
    assert_eq!(value["data"][0]["payout"], json!(0.0));
    assert_eq!(value["total_clicks"], json!(3));
    assert_eq!(value["data_source"], json!("Everflow API (columns/rows)"));
}

#[test]
fn test_flat_data_passthrough() {
    let raw = json!({"data": [1, 2, 3]});

    let result = normalize(&raw);
    assert_eq!(result.source_shape(), SourceShape::Flat);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        json!({"data": [1, 2, 3], "count": 3, "data_source": "Everflow API (flat)"})
    );
}

#[test]
fn test_empty_object_is_unrecognized() {
    let raw = json!({});

    let result = normalize(&raw);
    assert_eq!(result.source_shape(), SourceShape::Unrecognized);
    assert!(matches!(
        &result,
        NormalizedResult::Unrecognized { raw: kept, .. } if kept == &raw
    ));

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["error"], json!(true));
    assert_eq!(value["raw"], json!({}));
}

#[test]
fn test_everflow_error_payload_is_unrecognized() {
    // Everflow 錯誤回應沒有 table/data 欄位
    let raw = json!({"Error": "Invalid API key", "status": 401});
    let result = normalize(&raw);
    assert!(result.is_unrecognized());
}

#[test]
fn test_table_row_with_empty_list_reporting_is_kept() {
    let raw = json!({"table": [{
        "columns": [{"column_type": "offer", "id": "1", "label": "A"}],
        "reporting": []
    }]});

    let result = normalize(&raw);
    assert_eq!(result.count(), 1);
    assert_eq!(result.records()[0].id, "1");
    assert_eq!(result.records()[0].profit(), 0.0);
    assert_eq!(result.totals().unwrap().clicks, 0);
}
