// Pipeline processing: row validation and catalog enrichment

pub mod enrich;
pub mod quality_gate;
