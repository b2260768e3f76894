use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::CatalogPort;
use crate::domain::{EnrichedRecord, ProductMetadata, Record};

/// Optional uppercase "P" prefix followed by digits only: P101, P5, 101
static PRODUCT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P?([0-9]+)$").expect("valid product number pattern"));

/// One product as listed by the remote catalog
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CatalogProduct {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl fmt::Display for CatalogProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "title={}, category={}, brand={}, rating={}",
            show(&self.title),
            show(&self.category),
            show(&self.brand),
            self.rating.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
        )
    }
}

/// Body of `GET /products`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

/// Metadata kept per product in the catalog mapping
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub title: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub rating: Option<f64>,
}

impl CatalogEntry {
    /// Metadata to merge into a record, only if all three fields are present
    pub fn metadata(&self) -> Option<ProductMetadata> {
        Some(ProductMetadata {
            category: self.category.clone()?,
            brand: self.brand.clone()?,
            rating: self.rating?,
        })
    }
}

/// Product number -> catalog metadata, built once per run
#[derive(Debug, Clone, Default)]
pub struct CatalogMapping {
    entries: HashMap<u64, CatalogEntry>,
}

/// Outcome of looking a product identifier up in the mapping
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched(ProductMetadata),
    /// Well-formed identifier with no complete catalog entry
    Unmatched,
    /// Identifier has no extractable product number
    Malformed,
}

impl MatchResult {
    fn label(&self) -> &'static str {
        match self {
            Self::Matched(_) => "matched",
            Self::Unmatched => "unmatched",
            Self::Malformed => "malformed",
        }
    }
}

impl CatalogMapping {
    /// Build the mapping from a catalog listing; products without an id are skipped
    pub fn from_products(products: &[CatalogProduct]) -> Self {
        let entries = products
            .iter()
            .filter_map(|p| {
                p.id.map(|id| {
                    (
                        id,
                        CatalogEntry {
                            title: p.title.clone(),
                            category: p.category.clone(),
                            brand: p.brand.clone(),
                            rating: p.rating,
                        },
                    )
                })
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, id: u64) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, product_id: &str) -> MatchResult {
        let Some(number) = extract_product_number(product_id) else {
            return MatchResult::Malformed;
        };
        match self.entries.get(&number).and_then(CatalogEntry::metadata) {
            Some(metadata) => MatchResult::Matched(metadata),
            None => MatchResult::Unmatched,
        }
    }
}

/// Product number embedded in an identifier: "P101" -> 101
pub fn extract_product_number(product_id: &str) -> Option<u64> {
    PRODUCT_NUMBER
        .captures(product_id.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Merge catalog metadata into a copy of `record`; any failure is a miss
pub fn enrich_record(record: &Record, mapping: &CatalogMapping) -> EnrichedRecord {
    let result = mapping.lookup(&record.product_id);
    counter!("sales_catalog_lookups_total", "result" => result.label()).increment(1);
    match result {
        MatchResult::Matched(metadata) => EnrichedRecord::matched(record.clone(), metadata),
        MatchResult::Unmatched => EnrichedRecord::unmatched(record.clone()),
        MatchResult::Malformed => {
            debug!(product_id = %record.product_id, "No product number in identifier");
            EnrichedRecord::unmatched(record.clone())
        }
    }
}

pub fn enrich_sales_data(records: &[Record], mapping: &CatalogMapping) -> Vec<EnrichedRecord> {
    let enriched: Vec<EnrichedRecord> = records.iter().map(|r| enrich_record(r, mapping)).collect();
    let matched = enriched.iter().filter(|r| r.api_match()).count();
    if !enriched.is_empty() {
        info!(
            "Enriched {} records, {} matched ({:.1}%)",
            enriched.len(),
            matched,
            matched as f64 * 100.0 / enriched.len() as f64
        );
    }
    enriched
}

/// Fetch the whole catalog once. Failures degrade to an empty listing.
#[instrument(skip(port))]
pub fn fetch_all_products(port: &dyn CatalogPort, limit: u32) -> Vec<CatalogProduct> {
    match port.fetch_products(limit) {
        Ok(products) => {
            info!("Fetched {} catalog products", products.len());
            println!("✅ API Success: Fetched {} products", products.len());
            products
        }
        Err(e) => {
            warn!("Catalog fetch failed: {}", e);
            println!("❌ API Failed: {}", e);
            Vec::new()
        }
    }
}

/// Result of a single informational product lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(CatalogProduct),
    NotFound,
    Error(String),
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(product) => write!(f, "{product}"),
            Self::NotFound => f.write_str("no matching product"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// One catalog request, then a linear scan for the product's number
#[instrument(skip(port))]
pub fn fetch_product_info(port: &dyn CatalogPort, product_id: &str, limit: u32) -> LookupOutcome {
    let Some(number) = extract_product_number(product_id) else {
        debug!("Product identifier {} has no product number", product_id);
        return LookupOutcome::NotFound;
    };
    match port.fetch_products(limit) {
        Ok(products) => products
            .into_iter()
            .find(|p| p.id == Some(number))
            .map(LookupOutcome::Found)
            .unwrap_or(LookupOutcome::NotFound),
        Err(e) => {
            warn!("Single product lookup failed: {}", e);
            LookupOutcome::Error(e)
        }
    }
}

/// Bulk enrichment against a catalog port
pub struct CatalogEnricher<'a> {
    port: &'a dyn CatalogPort,
    page_size: u32,
}

impl<'a> CatalogEnricher<'a> {
    pub fn new(port: &'a dyn CatalogPort, page_size: u32) -> Self {
        Self { port, page_size }
    }

    pub fn build_mapping(&self) -> CatalogMapping {
        let products = fetch_all_products(self.port, self.page_size);
        CatalogMapping::from_products(&products)
    }

    /// Fetch the catalog once and enrich every record against it
    pub fn enrich(&self, records: &[Record]) -> Vec<EnrichedRecord> {
        let mapping = self.build_mapping();
        enrich_sales_data(records, &mapping)
    }

    pub fn lookup(&self, product_id: &str) -> LookupOutcome {
        fetch_product_info(self.port, product_id, self.page_size)
    }
}
