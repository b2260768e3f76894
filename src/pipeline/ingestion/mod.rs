// Pipeline ingestion: reading the raw sales file into lines

pub mod reader;

pub use reader::{read_sales_file, TextEncoding};
