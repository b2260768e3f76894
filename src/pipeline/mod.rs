// Sales pipeline: read -> validate -> (enrich) -> report

pub mod ingestion;
pub mod processing;
pub mod report;

use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::app::ports::CatalogPort;
use crate::config::Config;
use crate::error::Result;
use crate::infra::enrich_output_adapter::save_enriched_data;
use processing::enrich::{CatalogEnricher, LookupOutcome};
use processing::quality_gate::{clean_and_validate_sales, ValidationOutcome};
use report::{generate_report, ReportSource, SalesSummary};

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub input_path: String,
    pub total_parsed: usize,
    pub invalid_removed: usize,
    pub valid_records: usize,
    /// Records that matched the catalog, if enrichment ran
    pub matched_records: Option<usize>,
    pub enriched_path: Option<String>,
    pub report_path: String,
    pub summary: SalesSummary,
    /// Informational lookup for the first valid record
    pub sample_lookup: Option<(String, LookupOutcome)>,
}

pub struct Pipeline<'a> {
    config: Config,
    catalog: Option<&'a dyn CatalogPort>,
}

impl<'a> Pipeline<'a> {
    /// `catalog` is only consulted when enrichment is enabled in `config`
    pub fn new(config: Config, catalog: Option<&'a dyn CatalogPort>) -> Self {
        Self { config, catalog }
    }

    /// Read and validate the configured input file
    #[instrument(skip(self), fields(input = %self.config.input.path))]
    pub fn validate_input(&self) -> Result<ValidationOutcome> {
        let encodings = self.config.encodings()?;

        println!("\n--- Reading sales data file ---");
        let lines = ingestion::read_sales_file(&self.config.input.path, &encodings)?;
        println!("Read {} lines from {}", lines.len(), self.config.input.path);

        println!("\n--- Cleaning & validating data ---");
        let outcome = clean_and_validate_sales(&lines, &self.config.validation_config())?;
        println!("Total records parsed: {}", outcome.total_parsed);
        println!("Invalid records removed: {}", outcome.invalid_removed);
        println!("Valid records after cleaning: {}", outcome.valid_count());
        for (reason, count) in outcome.rejection_counts() {
            info!(%reason, count, "Rejections by rule");
        }
        Ok(outcome)
    }

    /// Run every stage and persist the outputs
    #[instrument(skip(self), fields(input = %self.config.input.path))]
    pub fn run(&self) -> Result<PipelineResult> {
        let started = Instant::now();
        let outcome = self.validate_input()?;

        let catalog = self.catalog.filter(|_| self.config.catalog.enabled);
        if self.config.catalog.enabled && catalog.is_none() {
            warn!("Catalog enrichment enabled but no catalog client configured; skipping");
        }

        let report_path = self.config.output.report_path.clone();
        let (summary, matched_records, enriched_path) = match catalog {
            Some(port) => {
                println!("\n--- Enriching with product catalog ---");
                let enricher = CatalogEnricher::new(port, self.config.catalog.page_size);
                let enriched = enricher.enrich(&outcome.valid_records);
                let matched = enriched.iter().filter(|r| r.api_match()).count();
                println!("Matched {} of {} records against the catalog", matched, enriched.len());
                save_enriched_data(&enriched, &self.config.output.enriched_path)?;

                println!("\n--- Generating report ---");
                let summary = generate_report(ReportSource::Enriched(&enriched), &report_path)?;
                (summary, Some(matched), Some(self.config.output.enriched_path.clone()))
            }
            None => {
                println!("\n--- Generating report ---");
                let summary = generate_report(ReportSource::Plain(&outcome.valid_records), &report_path)?;
                (summary, None, None)
            }
        };

        println!("\n--- Summary Report ---");
        println!("{summary}");

        let sample_lookup = match (catalog, outcome.valid_records.first()) {
            (Some(port), Some(first)) if self.config.catalog.sample_lookup => {
                println!("\n--- Fetching product info from API ---");
                let lookup = CatalogEnricher::new(port, self.config.catalog.page_size).lookup(&first.product_id);
                println!("API Data for {}: {}", first.product_id, lookup);
                Some((first.product_id.clone(), lookup))
            }
            _ => None,
        };

        println!("\n✅ Output saved in: {}", report_path);
        info!("Pipeline finished in {:.2}s", started.elapsed().as_secs_f64());

        Ok(PipelineResult {
            input_path: self.config.input.path.clone(),
            total_parsed: outcome.total_parsed,
            invalid_removed: outcome.invalid_removed,
            valid_records: outcome.valid_count(),
            matched_records,
            enriched_path,
            report_path,
            summary,
            sample_lookup,
        })
    }
}
