use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::constants;
use crate::error::{PipelineError, Result};
use crate::pipeline::ingestion::reader::TextEncoding;
use crate::pipeline::processing::quality_gate::{HeaderPolicy, ValidationConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub validation: ValidationSection,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: String,
    /// Encoding labels tried in order, e.g. ["utf-8", "latin-1"]
    pub encodings: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: constants::DEFAULT_INPUT_PATH.to_string(),
            encodings: constants::DEFAULT_ENCODINGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub expected_headers: Vec<String>,
    pub strict_headers: bool,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            expected_headers: constants::SALES_HEADERS.iter().map(|s| s.to_string()).collect(),
            strict_headers: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub enabled: bool,
    pub base_url: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
    /// Run a single informational lookup for the first valid record
    pub sample_lookup: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: constants::DEFAULT_CATALOG_URL.to_string(),
            page_size: constants::DEFAULT_CATALOG_PAGE_SIZE,
            timeout_seconds: constants::DEFAULT_CATALOG_TIMEOUT_SECS,
            sample_lookup: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: String,
    pub enriched_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: constants::DEFAULT_REPORT_PATH.to_string(),
            enriched_path: constants::DEFAULT_ENRICHED_PATH.to_string(),
        }
    }
}

impl Config {
    /// Load the TOML file at `config_path` (defaults if absent), then apply
    /// environment overrides.
    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let config_path = config_path.as_ref();
        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(config_path).map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path.display(),
                    e
                ))
            })?;
            info!("Loaded configuration from {}", config_path.display());
            Self::from_toml_str(&config_content)?
        } else {
            debug!("No config file at {}, using defaults", config_path.display());
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply `SALES_*` overrides. The lookup is injected so tests don't have
    /// to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("SALES_INPUT_PATH") {
            self.input.path = v;
        }
        if let Some(v) = non_empty("SALES_REPORT_PATH") {
            self.output.report_path = v;
        }
        if let Some(v) = non_empty("SALES_ENRICHED_PATH") {
            self.output.enriched_path = v;
        }
        if let Some(v) = non_empty("SALES_CATALOG_URL") {
            self.catalog.base_url = v;
        }
        if let Some(v) = non_empty("SALES_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_seconds = v.trim().parse().map_err(|_| {
                PipelineError::Config(format!("SALES_CATALOG_TIMEOUT_SECS is not a number: {v}"))
            })?;
        }
        if let Some(v) = non_empty("SALES_ENRICHMENT_ENABLED") {
            self.catalog.enabled = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(PipelineError::Config(format!(
                        "SALES_ENRICHMENT_ENABLED must be a boolean, got '{other}'"
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.timeout_seconds == 0 {
            return Err(PipelineError::Config(
                "catalog.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.catalog.page_size == 0 {
            return Err(PipelineError::Config(
                "catalog.page_size must be greater than zero".to_string(),
            ));
        }
        if self.validation.expected_headers.is_empty() {
            return Err(PipelineError::Config(
                "validation.expected_headers must not be empty".to_string(),
            ));
        }
        self.encodings()?;
        Ok(())
    }

    pub fn encodings(&self) -> Result<Vec<TextEncoding>> {
        if self.input.encodings.is_empty() {
            return Err(PipelineError::Config("input.encodings must not be empty".to_string()));
        }
        self.input
            .encodings
            .iter()
            .map(|label| {
                TextEncoding::from_label(label)
                    .ok_or_else(|| PipelineError::Config(format!("Unknown encoding: {label}")))
            })
            .collect()
    }

    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            expected_headers: self.validation.expected_headers.clone(),
            header_policy: if self.validation.strict_headers {
                HeaderPolicy::Strict
            } else {
                HeaderPolicy::Tolerate
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_legacy_layout() {
        let config = Config::default();
        assert_eq!(config.input.path, "data/sales_data.txt");
        assert_eq!(config.output.report_path, "output/sales_report.csv");
        assert_eq!(config.catalog.timeout_seconds, 10);
        assert_eq!(config.catalog.page_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_sections() {
        let config = Config::from_toml_str(
            r#"
            [catalog]
            enabled = false
            timeout_seconds = 3

            [validation]
            strict_headers = true
            "#,
        )
        .unwrap();

        assert!(!config.catalog.enabled);
        assert_eq!(config.catalog.timeout_seconds, 3);
        assert_eq!(config.catalog.base_url, "https://dummyjson.com");
        assert_eq!(config.input.encodings.len(), 4);
        assert_eq!(config.validation_config().header_policy, HeaderPolicy::Strict);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SALES_INPUT_PATH", "/tmp/in.txt"),
            ("SALES_CATALOG_TIMEOUT_SECS", "5"),
            ("SALES_ENRICHMENT_ENABLED", "off"),
            ("SALES_REPORT_PATH", "  "),
        ]);
        let mut config = Config::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.input.path, "/tmp/in.txt");
        assert_eq!(config.catalog.timeout_seconds, 5);
        assert!(!config.catalog.enabled);
        assert_eq!(config.output.report_path, "output/sales_report.csv");
    }

    #[test]
    fn bad_env_timeout_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(|k| (k == "SALES_CATALOG_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn unknown_encoding_label_is_rejected() {
        let mut config = Config::default();
        config.input.encodings = vec!["utf-8".to_string(), "klingon".to_string()];
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn load_from_reads_file_or_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[catalog]\npage_size = 30\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.catalog.page_size, 30);

        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.catalog.page_size, 100);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.catalog.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
