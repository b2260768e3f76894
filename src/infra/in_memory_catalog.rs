use std::cell::Cell;

use crate::app::ports::CatalogPort;
use crate::pipeline::processing::enrich::CatalogProduct;

/// Catalog held in memory. Used for offline runs and tests; can be told to
/// fail every request to exercise the degraded paths.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: Vec<CatalogProduct>,
    failure: Option<String>,
    requests: Cell<usize>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self {
            products,
            failure: None,
            requests: Cell::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            products: Vec::new(),
            failure: Some(message.to_string()),
            requests: Cell::new(0),
        }
    }

    /// Number of fetches served so far
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl CatalogPort for InMemoryCatalog {
    fn fetch_products(&self, limit: u32) -> Result<Vec<CatalogProduct>, String> {
        self.requests.set(self.requests.get() + 1);
        if let Some(message) = &self.failure {
            return Err(message.clone());
        }
        Ok(self.products.iter().take(limit as usize).cloned().collect())
    }
}
