use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::app::ports::CatalogPort;
use crate::error::Result;
use crate::pipeline::processing::enrich::{CatalogPage, CatalogProduct};

/// Blocking HTTP catalog client, e.g. against `https://dummyjson.com`
pub struct ReqwestCatalog {
    client: Client,
    base_url: String,
}

impl ReqwestCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }
}

impl CatalogPort for ReqwestCatalog {
    fn fetch_products(&self, limit: u32) -> std::result::Result<Vec<CatalogProduct>, String> {
        let url = self.products_url();
        debug!("GET {}?limit={}", url, limit);
        let resp = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        let page: CatalogPage = resp.json().map_err(|e| e.to_string())?;
        Ok(page.products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_url_ignores_trailing_slash() {
        let catalog = ReqwestCatalog::new("https://dummyjson.com/", Duration::from_secs(10)).unwrap();
        assert_eq!(catalog.products_url(), "https://dummyjson.com/products");
    }

    #[test]
    fn unreachable_host_reports_error_string() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let catalog = ReqwestCatalog::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = catalog.fetch_products(5).unwrap_err();
        assert!(!err.is_empty());
    }
}
