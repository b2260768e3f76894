use serde::Serialize;

/// A sales transaction that passed every validation rule. Serializes to the
/// eight input columns, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    /// Kept exactly as it appeared in the input (after trimming)
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "ProductID")]
    pub product_id: String,
    #[serde(rename = "ProductName")]
    pub product_name: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "UnitPrice")]
    pub unit_price: f64,
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    #[serde(rename = "Region")]
    pub region: String,
}

impl Record {
    pub fn total_amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Catalog metadata merged into a record on a successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMetadata {
    pub category: String,
    pub brand: String,
    pub rating: f64,
}

/// A record plus the outcome of its catalog lookup.
///
/// `api` is either fully populated or absent, so the three metadata columns
/// can never be partially filled.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: Record,
    pub api: Option<ProductMetadata>,
}

impl EnrichedRecord {
    pub fn matched(record: Record, metadata: ProductMetadata) -> Self {
        Self {
            record,
            api: Some(metadata),
        }
    }

    pub fn unmatched(record: Record) -> Self {
        Self { record, api: None }
    }

    pub fn api_match(&self) -> bool {
        self.api.is_some()
    }

    pub fn api_category(&self) -> Option<&str> {
        self.api.as_ref().map(|m| m.category.as_str())
    }

    pub fn api_brand(&self) -> Option<&str> {
        self.api.as_ref().map(|m| m.brand.as_str())
    }

    pub fn api_rating(&self) -> Option<f64> {
        self.api.as_ref().map(|m| m.rating)
    }
}

/// The four catalog columns of an output row. A miss renders as three empty
/// fields and `False`.
#[derive(Debug, Serialize)]
pub struct ApiColumns<'a> {
    #[serde(rename = "API_Category")]
    pub category: Option<&'a str>,
    #[serde(rename = "API_Brand")]
    pub brand: Option<&'a str>,
    #[serde(rename = "API_Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "API_Match")]
    pub matched: &'static str,
}

impl<'a> From<&'a EnrichedRecord> for ApiColumns<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        Self {
            category: record.api_category(),
            brand: record.api_brand(),
            rating: record.api_rating(),
            matched: if record.api_match() { "True" } else { "False" },
        }
    }
}

/// One row of the enriched output: the sales columns, then the catalog columns
#[derive(Debug, Serialize)]
pub struct EnrichedRow<'a> {
    pub record: &'a Record,
    pub api: ApiColumns<'a>,
}

impl<'a> From<&'a EnrichedRecord> for EnrichedRow<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        Self {
            record: &record.record,
            api: ApiColumns::from(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record {
            transaction_id: "T001".to_string(),
            date: "2024-01-15".to_string(),
            product_id: "P101".to_string(),
            product_name: "MouseWireless".to_string(),
            quantity: 3,
            unit_price: 25.5,
            customer_id: "C001".to_string(),
            region: "North".to_string(),
        }
    }

    #[test]
    fn total_amount_multiplies_quantity_and_price() {
        assert_eq!(record().total_amount(), 76.5);
    }

    #[test]
    fn unmatched_record_has_no_metadata() {
        let enriched = EnrichedRecord::unmatched(record());
        assert!(!enriched.api_match());
        assert_eq!(enriched.api_category(), None);
        assert_eq!(enriched.api_brand(), None);
        assert_eq!(enriched.api_rating(), None);
    }

    #[test]
    fn api_columns_follow_match_state() {
        let hit = EnrichedRecord::matched(
            record(),
            ProductMetadata {
                category: "smartphones".to_string(),
                brand: "Apple".to_string(),
                rating: 4.69,
            },
        );
        let columns = ApiColumns::from(&hit);
        assert_eq!(columns.category, Some("smartphones"));
        assert_eq!(columns.rating, Some(4.69));
        assert_eq!(columns.matched, "True");

        let miss = EnrichedRecord::unmatched(record());
        let columns = ApiColumns::from(&miss);
        assert_eq!(columns.brand, None);
        assert_eq!(columns.matched, "False");
    }
}
