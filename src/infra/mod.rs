pub mod enrich_output_adapter;
pub mod http_client;
pub mod in_memory_catalog;
