// 📂 CSV ingestion - Online Retail II export → TransactionRecord
//
// Only the columns the engine needs are read; StockCode, Description and
// Country are ignored. Both the 2009-2011 export names (Invoice, Price,
// "Customer ID") and the older UCI names (InvoiceNo, UnitPrice, CustomerID)
// are accepted.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::record::{CustomerId, TransactionRecord};

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Invoice", alias = "InvoiceNo")]
    invoice: String,

    #[serde(rename = "Quantity")]
    quantity: i64,

    #[serde(rename = "InvoiceDate")]
    invoice_date: String,

    #[serde(rename = "Price", alias = "UnitPrice")]
    price: String,

    #[serde(rename = "Customer ID", alias = "CustomerID", default)]
    customer_id: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Result<TransactionRecord> {
        let unit_price = Decimal::from_str(self.price.trim())
            .with_context(|| format!("Invalid price: {}", self.price))?;
        let customer_id = parse_customer_id(self.customer_id.as_deref())?;
        let invoice_timestamp = parse_timestamp(&self.invoice_date)?;

        Ok(TransactionRecord::new(
            self.invoice.trim(),
            customer_id,
            self.quantity,
            unit_price,
            invoice_timestamp,
        ))
    }
}

/// Load every row of a CSV export
pub fn load_csv(csv_path: &Path) -> Result<Vec<TransactionRecord>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;
    let records = read_records(file)?;
    debug!(path = ?csv_path, records = records.len(), "loaded transactions");
    Ok(records)
}

/// Read records from any CSV source with a header row
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize::<RawRow>().enumerate() {
        // +2: header row, 1-based lines
        let line = index + 2;
        let row = result.with_context(|| format!("Failed to deserialize line {line}"))?;
        records.push(row.into_record().with_context(|| format!("Invalid record on line {line}"))?);
    }

    Ok(records)
}

/// Empty → no customer. Spreadsheet exports often write ids as `17850.0`.
fn parse_customer_id(raw: Option<&str>) -> Result<Option<CustomerId>> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if let Ok(id) = text.parse::<CustomerId>() {
        return Ok(Some(id));
    }

    let value = Decimal::from_str(text).with_context(|| format!("Invalid customer id: {text}"))?;
    if !value.fract().is_zero() {
        bail!("Customer id is not a whole number: {text}");
    }
    value
        .to_u64()
        .map(Some)
        .ok_or_else(|| anyhow!("Customer id out of range: {text}"))
}

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let text = raw.trim().trim_end_matches('Z');

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }

    // Date-only exports
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Unrecognised invoice date: {raw}"))
}

/// Reference date for a snapshot: midnight of the latest invoice day plus
/// `offset_days`. `None` when there are no records.
pub fn suggest_reference_date(records: &[TransactionRecord], offset_days: u32) -> Option<NaiveDateTime> {
    let latest = records.iter().map(|r| r.invoice_timestamp).max()?;
    let day = latest.date() + Duration::days(i64::from(offset_days));
    day.and_hms_opt(0, 0, 0)
}
