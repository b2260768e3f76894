use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::constants::{ENRICHMENT_HEADERS, SALES_HEADERS, TOTAL_AMOUNT_HEADER};
use crate::domain::{ApiColumns, EnrichedRecord, Record};
use crate::error::Result;

/// Records handed to the report stage, with or without catalog enrichment
#[derive(Debug, Clone, Copy)]
pub enum ReportSource<'a> {
    Plain(&'a [Record]),
    Enriched(&'a [EnrichedRecord]),
}

impl<'a> ReportSource<'a> {
    fn records(&self) -> Vec<&'a Record> {
        match *self {
            Self::Plain(records) => records.iter().collect(),
            Self::Enriched(records) => records.iter().map(|r| &r.record).collect(),
        }
    }

    fn headers(&self) -> Vec<&'static str> {
        let mut headers: Vec<&'static str> = SALES_HEADERS.to_vec();
        headers.push(TOTAL_AMOUNT_HEADER);
        if let Self::Enriched(_) = self {
            headers.extend(ENRICHMENT_HEADERS);
        }
        headers
    }

    fn rows(&self) -> Vec<ReportRow<'a>> {
        match *self {
            Self::Plain(records) => records.iter().map(|r| ReportRow::new(r, None)).collect(),
            Self::Enriched(records) => records
                .iter()
                .map(|r| ReportRow::new(&r.record, Some(ApiColumns::from(r))))
                .collect(),
        }
    }
}

/// One report line. Headers are written up front, so the nested fields only
/// have to serialize in column order.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    record: &'a Record,
    total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    api: Option<ApiColumns<'a>>,
}

impl<'a> ReportRow<'a> {
    fn new(record: &'a Record, api: Option<ApiColumns<'a>>) -> Self {
        Self {
            record,
            total_amount: record.total_amount(),
            api,
        }
    }
}

/// Aggregates over all reported records
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub total_sales: f64,
    pub total_transactions: usize,
    /// Region with the highest summed TotalAmount
    pub top_region: Option<String>,
    /// ProductName with the highest summed TotalAmount
    pub top_product: Option<String>,
}

impl fmt::Display for SalesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Sales: {:.2}", self.total_sales)?;
        writeln!(f, "Total Transactions: {}", self.total_transactions)?;
        writeln!(f, "Top Region: {}", self.top_region.as_deref().unwrap_or("-"))?;
        write!(f, "Top Product: {}", self.top_product.as_deref().unwrap_or("-"))
    }
}

/// Key with the largest summed amount. Keys are visited in sorted order and
/// the first one reaching the maximum wins ties.
fn top_group<'a>(pairs: impl Iterator<Item = (&'a str, f64)>) -> Option<String> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for (key, amount) in pairs {
        *groups.entry(key).or_insert(0.0) += amount;
    }
    let mut best: Option<(&str, f64)> = None;
    for (key, total) in groups {
        if best.map_or(true, |(_, best_total)| total > best_total) {
            best = Some((key, total));
        }
    }
    best.map(|(key, _)| key.to_string())
}

pub fn summarize(records: &[&Record]) -> SalesSummary {
    SalesSummary {
        total_sales: records.iter().map(|r| r.total_amount()).sum(),
        total_transactions: records.len(),
        top_region: top_group(records.iter().map(|r| (r.region.as_str(), r.total_amount()))),
        top_product: top_group(records.iter().map(|r| (r.product_name.as_str(), r.total_amount()))),
    }
}

/// Write the flat report table as CSV and return the summary aggregates
#[instrument(skip_all, fields(output = %output_path.as_ref().display()))]
pub fn generate_report(source: ReportSource<'_>, output_path: impl AsRef<Path>) -> Result<SalesSummary> {
    let path = output_path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(source.headers())?;
    let rows = source.rows();
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} report rows to {}", rows.len(), path.display());

    Ok(summarize(&source.records()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductMetadata;
    use tempfile::tempdir;

    fn record(id: &str, name: &str, qty: i64, price: f64, region: &str) -> Record {
        Record {
            transaction_id: id.to_string(),
            date: "2024-01-15".to_string(),
            product_id: "P101".to_string(),
            product_name: name.to_string(),
            quantity: qty,
            unit_price: price,
            customer_id: "C001".to_string(),
            region: region.to_string(),
        }
    }

    #[test]
    fn summary_totals_and_top_groups() {
        let records = vec![
            record("T1", "Mouse", 2, 25.5, "North"),
            record("T2", "Laptop", 1, 900.0, "South"),
            record("T3", "Mouse", 10, 25.5, "North"),
            record("T4", "Cable", 3, 5.0, "East"),
        ];
        let refs: Vec<&Record> = records.iter().collect();
        let summary = summarize(&refs);

        assert_eq!(summary.total_transactions, 4);
        assert!((summary.total_sales - 1221.0).abs() < 1e-9);
        assert_eq!(summary.top_region.as_deref(), Some("South"));
        assert_eq!(summary.top_product.as_deref(), Some("Laptop"));
    }

    #[test]
    fn ties_go_to_first_key_in_sorted_order() {
        let records = vec![
            record("T1", "Zebra", 1, 10.0, "West"),
            record("T2", "Apple", 1, 10.0, "East"),
        ];
        let refs: Vec<&Record> = records.iter().collect();
        let summary = summarize(&refs);
        assert_eq!(summary.top_region.as_deref(), Some("East"));
        assert_eq!(summary.top_product.as_deref(), Some("Apple"));
    }

    #[test]
    fn empty_input_has_no_top_groups() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.total_sales, 0.0);
        assert_eq!(summary.top_region, None);
        assert_eq!(summary.top_product, None);
    }

    #[test]
    fn plain_report_has_total_amount_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("report.csv");
        let records = vec![record("T1", "Mouse", 2, 25.5, "North")];

        let summary = generate_report(ReportSource::Plain(&records), &path).unwrap();
        assert_eq!(summary.total_transactions, 1);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "TransactionID,Date,ProductID,ProductName,Quantity,UnitPrice,CustomerID,Region,TotalAmount",
                "T1,2024-01-15,P101,Mouse,2,25.5,C001,North,51.0",
            ]
        );
    }

    #[test]
    fn enriched_report_appends_api_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let records = vec![
            EnrichedRecord::matched(
                record("T1", "Phone", 1, 549.0, "North"),
                ProductMetadata {
                    category: "smartphones".to_string(),
                    brand: "Apple".to_string(),
                    rating: 4.69,
                },
            ),
            EnrichedRecord::unmatched(record("T2", "Cable", 1, 5.0, "East")),
        ];

        generate_report(ReportSource::Enriched(&records), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].ends_with("TotalAmount,API_Category,API_Brand,API_Rating,API_Match"));
        assert_eq!(lines[1], "T1,2024-01-15,P101,Phone,1,549.0,C001,North,549.0,smartphones,Apple,4.69,True");
        assert_eq!(lines[2], "T2,2024-01-15,P101,Cable,1,5.0,C001,East,5.0,,,,False");
    }

    #[test]
    fn empty_report_still_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        generate_report(ReportSource::Plain(&[]), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
