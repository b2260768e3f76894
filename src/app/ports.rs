use crate::pipeline::processing::enrich::CatalogProduct;

/// Source of product catalog listings.
///
/// Failures are reported as plain strings; callers decide how to degrade.
pub trait CatalogPort {
    /// Fetch one page of at most `limit` products
    fn fetch_products(&self, limit: u32) -> Result<Vec<CatalogProduct>, String>;
}

impl<T: CatalogPort + ?Sized> CatalogPort for Box<T> {
    fn fetch_products(&self, limit: u32) -> Result<Vec<CatalogProduct>, String> {
        (**self).fetch_products(limit)
    }
}
