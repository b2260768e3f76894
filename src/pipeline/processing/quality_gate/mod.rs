use chrono::NaiveDate;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::constants::{FIELD_DELIMITER, SALES_HEADERS};
use crate::domain::Record;
use crate::error::{PipelineError, Result};

/// Four-digit year; month and day may drop their leading zero (2024-1-5)
static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}$").expect("valid date pattern"));

/// What to do when the header row differs from the expected column names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Log a warning and assume the expected column order
    #[default]
    Tolerate,
    /// Abort the run with `PipelineError::HeaderMismatch`
    Strict,
}

/// Configuration for the quality gate
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Column names the header row should contain, in order
    pub expected_headers: Vec<String>,
    pub header_policy: HeaderPolicy,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expected_headers: SALES_HEADERS.iter().map(|s| s.to_string()).collect(),
            header_policy: HeaderPolicy::Tolerate,
        }
    }
}

/// Result of inspecting the header row
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderCheck {
    Matched,
    Mismatched { found: Vec<String> },
    /// Input had no non-blank lines at all
    Missing,
}

/// Why a data row was dropped. Rules are checked in declaration order and
/// the first failing one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectionReason {
    /// Row did not split into exactly eight fields
    FieldCount,
    MissingCustomerOrRegion,
    /// TransactionID does not start with "T"
    BadTransactionPrefix,
    InvalidDate,
    UnparseableNumber,
    /// Quantity or UnitPrice is zero or negative
    NonPositiveAmount,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FieldCount => "field_count",
            Self::MissingCustomerOrRegion => "missing_customer_or_region",
            Self::BadTransactionPrefix => "bad_transaction_prefix",
            Self::InvalidDate => "invalid_date",
            Self::UnparseableNumber => "unparseable_number",
            Self::NonPositiveAmount => "non_positive_amount",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// 1-based position among the non-blank lines (the header is line 1)
    pub line_number: usize,
    pub reason: RejectionReason,
}

/// Everything the quality gate produces for one input file
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid_records: Vec<Record>,
    /// Non-blank data rows examined
    pub total_parsed: usize,
    /// Rows that failed any rule, each counted once
    pub invalid_removed: usize,
    pub header: HeaderCheck,
    pub rejections: Vec<Rejection>,
}

impl ValidationOutcome {
    pub fn valid_count(&self) -> usize {
        self.valid_records.len()
    }

    pub fn rejection_counts(&self) -> BTreeMap<RejectionReason, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejections {
            *counts.entry(rejection.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Sales quality gate: applies the row rules to every data line
pub struct SalesQualityGate {
    pub config: ValidationConfig,
}

impl SalesQualityGate {
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Compare the header line against the expected column names
    pub fn check_header(&self, header_line: &str) -> HeaderCheck {
        let found: Vec<String> = header_line
            .trim()
            .split(FIELD_DELIMITER)
            .map(str::to_string)
            .collect();
        if found == self.config.expected_headers {
            HeaderCheck::Matched
        } else {
            HeaderCheck::Mismatched { found }
        }
    }

    /// Validate and clean one data row
    pub fn assess_row(&self, line: &str) -> std::result::Result<Record, RejectionReason> {
        let parts: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        let [transaction_id, date, product_id, product_name, quantity, unit_price, customer_id, region] =
            parts.as_slice()
        else {
            return Err(RejectionReason::FieldCount);
        };

        let transaction_id = transaction_id.trim();
        let date = date.trim();
        let product_id = product_id.trim();
        let product_name = clean_product_name(product_name);
        let customer_id = customer_id.trim();
        let region = region.trim();

        if customer_id.is_empty() || region.is_empty() {
            return Err(RejectionReason::MissingCustomerOrRegion);
        }

        if !transaction_id.starts_with('T') {
            return Err(RejectionReason::BadTransactionPrefix);
        }

        if !DATE_SHAPE.is_match(date) || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(RejectionReason::InvalidDate);
        }

        let quantity: i64 = clean_number(quantity)
            .parse()
            .map_err(|_| RejectionReason::UnparseableNumber)?;
        let unit_price: f64 = clean_number(unit_price)
            .parse()
            .map_err(|_| RejectionReason::UnparseableNumber)?;
        if !unit_price.is_finite() {
            return Err(RejectionReason::UnparseableNumber);
        }

        if quantity <= 0 || unit_price <= 0.0 {
            return Err(RejectionReason::NonPositiveAmount);
        }

        Ok(Record {
            transaction_id: transaction_id.to_string(),
            date: date.to_string(),
            product_id: product_id.to_string(),
            product_name,
            quantity,
            unit_price,
            customer_id: customer_id.to_string(),
            region: region.to_string(),
        })
    }

    /// Run the gate over all lines of a file. Blank lines are discarded
    /// first; the first remaining line is the header.
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn run<S: AsRef<str>>(&self, lines: &[S]) -> Result<ValidationOutcome> {
        let mut non_blank = lines
            .iter()
            .map(|l| l.as_ref())
            .filter(|l| !l.trim().is_empty());

        let header = match non_blank.next() {
            Some(header_line) => self.check_header(header_line),
            None => {
                warn!("Input contained no non-blank lines");
                HeaderCheck::Missing
            }
        };

        if let HeaderCheck::Mismatched { found } = &header {
            let expected = self.config.expected_headers.join("|");
            let found = found.join("|");
            match self.config.header_policy {
                HeaderPolicy::Strict => {
                    return Err(PipelineError::HeaderMismatch { expected, found });
                }
                HeaderPolicy::Tolerate => {
                    warn!(%expected, %found, "Header mismatch, assuming expected column order");
                }
            }
        }

        let mut valid_records = Vec::new();
        let mut rejections = Vec::new();
        let mut total_parsed = 0;

        // Header is non-blank line 1, so data rows start at 2
        for (idx, line) in non_blank.enumerate() {
            total_parsed += 1;
            let line_number = idx + 2;
            match self.assess_row(line) {
                Ok(record) => valid_records.push(record),
                Err(reason) => {
                    debug!(line_number, %reason, "Rejected row");
                    counter!("sales_rows_rejected_total", "reason" => reason.as_str()).increment(1);
                    rejections.push(Rejection { line_number, reason });
                }
            }
        }
        counter!("sales_rows_accepted_total").increment(valid_records.len() as u64);

        let outcome = ValidationOutcome {
            invalid_removed: rejections.len(),
            total_parsed,
            valid_records,
            header,
            rejections,
        };
        info!(
            total_parsed = outcome.total_parsed,
            invalid_removed = outcome.invalid_removed,
            valid = outcome.valid_count(),
            "Validation finished"
        );
        Ok(outcome)
    }
}

impl Default for SalesQualityGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point used by the pipeline: validate `lines` under `config`
pub fn clean_and_validate_sales<S: AsRef<str>>(
    lines: &[S],
    config: &ValidationConfig,
) -> Result<ValidationOutcome> {
    SalesQualityGate::with_config(config.clone()).run(lines)
}

/// Strip whitespace and thousands separators: " 1,500 " -> "1500"
fn clean_number(value: &str) -> String {
    value.trim().replace(',', "")
}

/// Commas in product names are delimiter artifacts: "Mouse,Wireless" -> "MouseWireless"
fn clean_product_name(name: &str) -> String {
    name.replace(',', "").trim().to_string()
}
