pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod pipeline;

// Ports (app) and their adapters (infra)
pub mod app;
pub mod infra;

pub use domain::{EnrichedRecord, ProductMetadata, Record};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineResult};
