/// Column names and default locations shared across the pipeline stages

pub const FIELD_DELIMITER: char = '|';

/// Column order of the sales input file
pub const SALES_HEADERS: [&str; 8] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
];

/// Columns appended to the enriched output file
pub const ENRICHMENT_HEADERS: [&str; 4] = ["API_Category", "API_Brand", "API_Rating", "API_Match"];

pub const TOTAL_AMOUNT_HEADER: &str = "TotalAmount";

pub const DEFAULT_INPUT_PATH: &str = "data/sales_data.txt";
pub const DEFAULT_REPORT_PATH: &str = "output/sales_report.csv";
pub const DEFAULT_ENRICHED_PATH: &str = "data/enriched_sales_data.txt";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";
pub const DEFAULT_CATALOG_PAGE_SIZE: u32 = 100;
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;

/// Encoding labels tried in order when decoding the input file
pub const DEFAULT_ENCODINGS: [&str; 4] = ["utf-8", "utf-8-sig", "latin-1", "cp1252"];

