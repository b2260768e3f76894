use anyhow::Context;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{error, info};

use sales_pipeline::app::ports::CatalogPort;
use sales_pipeline::config::Config;
use sales_pipeline::constants;
use sales_pipeline::infra::http_client::ReqwestCatalog;
use sales_pipeline::logging;
use sales_pipeline::pipeline::processing::enrich::fetch_product_info;
use sales_pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "sales_pipeline")]
#[command(about = "Clean, validate, enrich and report on sales transaction files")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline (the default when no command is given)
    Run {
        /// Sales file to process
        #[arg(long)]
        input: Option<String>,
        /// Do not contact the product catalog
        #[arg(long)]
        skip_enrichment: bool,
        /// Abort when the header row does not match the expected columns
        #[arg(long)]
        strict_headers: bool,
    },
    /// Read and validate the input file only
    Validate {
        #[arg(long)]
        input: Option<String>,
        #[arg(long)]
        strict_headers: bool,
    },
    /// Look up a single product in the catalog
    Lookup {
        /// Product identifier, e.g. P101
        product_id: String,
    },
}

fn build_catalog(config: &Config) -> anyhow::Result<ReqwestCatalog> {
    ReqwestCatalog::new(
        &config.catalog.base_url,
        Duration::from_secs(config.catalog.timeout_seconds),
    )
    .context("failed to build catalog HTTP client")
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;

    let command = cli.command.unwrap_or(Commands::Run {
        input: None,
        skip_enrichment: false,
        strict_headers: false,
    });

    match command {
        Commands::Run { input, skip_enrichment, strict_headers } => {
            if let Some(input) = input {
                config.input.path = input;
            }
            if skip_enrichment {
                config.catalog.enabled = false;
            }
            config.validation.strict_headers |= strict_headers;

            println!("🚀 Running sales pipeline on {}", config.input.path);
            let catalog = if config.catalog.enabled {
                Some(build_catalog(&config)?)
            } else {
                None
            };
            let pipeline = Pipeline::new(config, catalog.as_ref().map(|c| c as &dyn CatalogPort));

            match pipeline.run() {
                Ok(result) => {
                    info!(
                        total_parsed = result.total_parsed,
                        invalid_removed = result.invalid_removed,
                        valid = result.valid_records,
                        "Pipeline completed"
                    );
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Validate { input, strict_headers } => {
            if let Some(input) = input {
                config.input.path = input;
            }
            config.validation.strict_headers |= strict_headers;

            let pipeline = Pipeline::new(config, None);
            let outcome = pipeline.validate_input()?;
            for (reason, count) in outcome.rejection_counts() {
                println!("   {}: {}", reason, count);
            }
        }
        Commands::Lookup { product_id } => {
            let catalog = build_catalog(&config)?;
            let outcome = fetch_product_info(&catalog, &product_id, config.catalog.page_size);
            println!("API Data for {}: {}", product_id, outcome);
        }
    }
    Ok(())
}
