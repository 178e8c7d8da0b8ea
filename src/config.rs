use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::pipeline::KeyLayout;

/// Service settings, read from `IMPORT_*` environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImportConfig {
    /// Bucket uploads are signed for
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,

    /// Queue every decoded row is sent to
    #[serde(default)]
    pub catalog_items_queue_url: Option<String>,

    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,

    #[serde(default = "default_parsed_prefix")]
    pub parsed_prefix: String,

    /// Lifetime of a signed upload URL in seconds
    #[serde(default = "default_upload_url_ttl_secs")]
    pub upload_url_ttl_secs: u64,

    /// Overrides the AWS endpoint, e.g. for localstack
    #[serde(default)]
    pub aws_endpoint_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_bucket_name() -> String {
    "import-csv".to_string()
}

fn default_upload_prefix() -> String {
    "uploaded/".to_string()
}

fn default_parsed_prefix() -> String {
    "parsed/".to_string()
}

fn default_upload_url_ttl_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl ImportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("IMPORT"))
            .build()?
            .try_deserialize()
    }

    pub fn key_layout(&self) -> KeyLayout {
        KeyLayout::new(&self.upload_prefix, &self.parsed_prefix)
    }
}
