use std::fs;
use std::path::Path;
use tracing::info;

use crate::constants::{ENRICHMENT_HEADERS, FIELD_DELIMITER, SALES_HEADERS};
use crate::domain::{EnrichedRecord, EnrichedRow};
use crate::error::Result;

/// Write enriched records to a pipe-delimited file, header first. Fields are
/// written unquoted, as the input file is.
pub fn save_enriched_data(records: &[EnrichedRecord], file_path: impl AsRef<Path>) -> Result<()> {
    let path = file_path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(FIELD_DELIMITER as u8)
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(SALES_HEADERS.iter().chain(ENRICHMENT_HEADERS.iter()))?;
    for record in records {
        writer.serialize(EnrichedRow::from(record))?;
    }
    writer.flush()?;

    info!("Wrote {} enriched records to {}", records.len(), path.display());
    println!("✅ Enriched data saved to: {}", path.display());
    Ok(())
}
