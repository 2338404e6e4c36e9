use crate::error::BillingError;
use crate::models::{BillingRecord, BILLING_COLUMNS};
use std::io::Write;

/// 导出账单为 CSV (首行为列名，空列表也输出列名)
pub fn export_to_csv<W: Write>(records: &[BillingRecord], output: W) -> Result<W, BillingError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(BILLING_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| BillingError::Internal(format!("csv export: {}", e.error())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, NaiveTime};
    use std::str::FromStr;

    #[test]
    fn writes_header_for_empty_export() {
        let bytes = export_to_csv(&[], Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), BILLING_COLUMNS.join(","));
    }

    #[test]
    fn writes_one_row_per_record() {
        let record = BillingRecord {
            invoice_id: 100000001,
            client_id: 3,
            business_name: "Acme, Inc.".into(),
            service: "Design".into(),
            amount_usd: BigDecimal::from_str("500").unwrap(),
            tax_rate: BigDecimal::from_str("8.25").unwrap(),
            discount_percent: BigDecimal::from_str("5").unwrap(),
            status: "Paid".into(),
            date_updated: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time_updated: NaiveTime::from_hms_opt(14, 5, 9).unwrap(),
            tax_amount: BigDecimal::from_str("41.25").unwrap(),
            discount_amount: BigDecimal::from_str("25.00").unwrap(),
            final_total: BigDecimal::from_str("516.25").unwrap(),
            notes: None,
        };
        let bytes = export_to_csv(&[record], Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("100000001,3,\"Acme, Inc.\",Design,"));
        assert!(lines[1].contains("2024-03-01,14:05:09"));
        assert!(lines[1].ends_with("516.25,"));
    }
}
