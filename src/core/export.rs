use crate::domain::model::PerformanceRecord;
use crate::utils::error::Result;
use std::io::Write;

/// 以 CSV 輸出正規化後的紀錄，欄位與 JSON 輸出相同
pub fn write_csv<W: Write>(records: &[PerformanceRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in records {
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;
    tracing::debug!("Wrote {} records as CSV", records.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_csv() {
        let records = vec![
            PerformanceRecord {
                id: "42".to_string(),
                offer_label: Some("Offer A".to_string()),
                affiliate_label: Some("Partner, Inc".to_string()),
                advertiser_label: None,
                clicks: 100,
                conversions: 5,
                revenue: 50.0,
                payout: 10.0,
            },
            PerformanceRecord {
                id: "row_1".to_string(),
                offer_label: None,
                affiliate_label: None,
                advertiser_label: None,
                clicks: 0,
                conversions: 0,
                revenue: 0.0,
                payout: 0.0,
            },
        ];

        let mut buffer = Vec::new();
        write_csv(&records, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "id,offer,affiliate,advertiser,name,clicks,conversions,revenue,payout,profit,conversion_rate"
        );
        assert_eq!(
            lines[1],
            "42,Offer A,\"Partner, Inc\",,\"Partner, Inc\",100,5,50.0,10.0,40.0,5.0"
        );
        assert_eq!(lines[2], "row_1,,,,unknown,0,0,0.0,0.0,0.0,0.0");
    }

    #[test]
    fn test_write_csv_empty() {
        let mut buffer = Vec::new();
        write_csv(&[], &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }
}
