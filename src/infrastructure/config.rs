//! Configuration infrastructure
//!
//! Settings are layered: built-in defaults, then an optional config file
//! (TOML/JSON/YAML, picked by extension), then `CROSSREF__*` environment
//! variables. Every section falls back to its defaults when missing.

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable prefix for overrides, e.g. `CROSSREF__PIPELINE__CONCURRENCY=3`
pub const ENV_PREFIX: &str = "CROSSREF";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub pipeline: PipelineConfig,
    pub selectors: SelectorConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Target catalog site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin used for search URLs and for resolving relative product links
    pub origin: String,
    /// User agent sent with every request
    pub user_agent: String,
}

/// HTTP fetch behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Hard timeout per attempt
    pub timeout_seconds: u64,
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Fixed wait between attempts
    pub retry_delay_ms: u64,
}

/// Batch pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Items resolved concurrently
    pub concurrency: usize,
    /// Courtesy delay before the product page fetch
    pub pacing_delay_ms: u64,
    /// Also wait one pacing interval after each item settles
    pub trailing_delay: bool,
}

/// CSS selectors and marker classes of the catalog's markup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub results_container: String,
    pub product_card: String,
    pub card_link: String,
    pub product_title: String,
    pub product_price: String,
    pub cross_ref_heading: String,
    pub cross_ref_heading_text: String,
    pub row_marker_classes: Vec<String>,
    pub label_column: String,
    pub value_elements: String,
}

/// Spreadsheet output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub sheet_name: String,
    pub headers: [String; 4],
    pub not_found_label: String,
    pub no_analogs_label: String,
    /// Repeat brand/code on continuation rows instead of blanking them
    pub repeat_item_labels: bool,
    pub min_column_width: usize,
    pub max_column_width: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    /// Enable JSON formatted file logs
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    /// Directory for log files; next to the executable when unset
    pub log_dir: Option<PathBuf>,
    pub file_name: String,
    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: site::ORIGIN.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_retries: defaults::MAX_RETRIES,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::CONCURRENCY,
            pacing_delay_ms: defaults::PACING_DELAY_MS,
            trailing_delay: true,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            results_container: "#products-js".to_string(),
            product_card: ".card-col".to_string(),
            card_link: "a[href]".to_string(),
            product_title: "h1.product-title".to_string(),
            product_price: "[itemprop=\"price\"]".to_string(),
            cross_ref_heading: "h1, h2, h3, h4, h5, h6".to_string(),
            cross_ref_heading_text: "Cross-Reference Numbers".to_string(),
            row_marker_classes: vec!["row".to_string(), "py-2".to_string()],
            label_column: ".col-md-2, .col-4".to_string(),
            value_elements: ".col-md-10 span, .col-md-10 a".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            sheet_name: "Results".to_string(),
            headers: [
                "Brand".to_string(),
                "Code".to_string(),
                "Analogs".to_string(),
                "Value".to_string(),
            ],
            not_found_label: "Page not found".to_string(),
            no_analogs_label: "No analogs found".to_string(),
            repeat_item_labels: false,
            min_column_width: defaults::MIN_COLUMN_WIDTH,
            max_column_width: defaults::MAX_COLUMN_WIDTH,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("h2".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "error".to_string());
                filters.insert("selectors".to_string(), "error".to_string());
                filters
            },
        }
    }
}

impl HttpConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl PipelineConfig {
    pub const fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

impl CrawlerConfig {
    /// Load defaults, then `path` (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            info!("Loading configuration from: {:?}", path);
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the per-user config file when it exists, defaults otherwise.
    pub fn load_default_location() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(Some(&path)),
            _ => Self::load(None),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.concurrency == 0 {
            return Err(ConfigError::Validation {
                message: "pipeline.concurrency must be greater than 0".to_string(),
            });
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "http.timeout_seconds must be greater than 0".to_string(),
            });
        }

        if url::Url::parse(&self.site.origin).is_err() {
            return Err(ConfigError::Validation {
                message: format!("site.origin is not an absolute URL: {}", self.site.origin),
            });
        }

        if self.report.min_column_width > self.report.max_column_width {
            return Err(ConfigError::Validation {
                message: "report.min_column_width cannot be greater than max_column_width"
                    .to_string(),
            });
        }

        if self.selectors.row_marker_classes.is_empty() {
            return Err(ConfigError::Validation {
                message: "selectors.row_marker_classes must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Per-user config file location (`<config dir>/crossref-harvester/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR_NAME).join("config.toml"))
}

/// Target site constants
pub mod site {
    /// Catalog origin
    pub const ORIGIN: &str = "https://spareto.com";

    /// Search path on the origin
    pub const SEARCH_PATH: &str = "/products";
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "crossref-harvester";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

    /// Per-attempt request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 15;

    /// Additional attempts after a failed fetch
    pub const MAX_RETRIES: u32 = 2;

    /// Fixed wait between fetch attempts
    pub const RETRY_DELAY_MS: u64 = 1000;

    /// Concurrent item resolutions
    pub const CONCURRENCY: usize = 5;

    /// Courtesy delay between dependent requests
    pub const PACING_DELAY_MS: u64 = 800;

    pub const OUTPUT_DIR: &str = "outputs";

    pub const MIN_COLUMN_WIDTH: usize = 10;
    pub const MAX_COLUMN_WIDTH: usize = 60;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FILE_NAME: &str = "crossref-harvester.log";
}
