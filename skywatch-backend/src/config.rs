use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the reference CSV and the usage ledger
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    pub location: LocationConfig,

    pub feed: FeedConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,

    #[serde(default)]
    pub usage: UsageConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// Fixed ground location the overhead query is made for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level
    #[serde(default)]
    pub altitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub api_key: String,

    #[serde(default = "default_feed_base_url")]
    pub base_url: String,

    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,

    /// Search radius in degrees used when the caller gives none
    #[serde(default = "default_radius")]
    pub default_radius: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Document viewer page that wraps the spreadsheet link
    #[serde(default = "default_viewer_url")]
    pub viewer_url: String,

    #[serde(default = "default_expected_extension")]
    pub expected_extension: String,

    #[serde(default = "default_viewer_timeout_secs")]
    pub viewer_timeout_secs: u64,

    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,

    /// Files at or below this size are treated as truncated
    #[serde(default = "default_min_size_bytes")]
    pub min_size_bytes: u64,

    #[serde(default = "default_reference_file")]
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    #[serde(default = "default_usage_limit")]
    pub limit: u64,

    #[serde(default = "default_window_days")]
    pub window_days: i64,

    #[serde(default = "default_usage_file")]
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_unknown_country")]
    pub unknown_country: String,

    #[serde(default = "default_not_applicable")]
    pub not_applicable: String,

    /// Cell values treated as empty (compared case-insensitively)
    #[serde(default = "default_missing_tokens")]
    pub missing_tokens: Vec<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Applied in order after title-casing
    #[serde(default = "default_substitutions")]
    pub substitutions: Vec<Substitution>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1610
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_feed_base_url() -> String {
    "https://api.n2yo.com/rest/v1".to_string()
}

fn default_feed_timeout_secs() -> u64 {
    10
}

fn default_radius() -> u32 {
    30
}

fn default_viewer_url() -> String {
    "https://view.officeapps.live.com/op/view.aspx?\
     src=https%3A%2F%2Fwww.ucs.org%2Fsites%2Fdefault%2Ffiles%2F2024-01%2F\
     UCS-Satellite-Database%25205-1-2023.xlsx&wdOrigin=BROWSELINK"
        .to_string()
}

fn default_expected_extension() -> String {
    ".xlsx".to_string()
}

fn default_viewer_timeout_secs() -> u64 {
    25
}

fn default_download_timeout_secs() -> u64 {
    40
}

fn default_max_age_days() -> u64 {
    30
}

fn default_min_size_bytes() -> u64 {
    100_000
}

fn default_reference_file() -> String {
    "reference_satellites.csv".to_string()
}

fn default_usage_limit() -> u64 {
    1000
}

fn default_window_days() -> i64 {
    30
}

fn default_usage_file() -> String {
    "usage.json".to_string()
}

fn default_unknown_country() -> String {
    "Unknown".to_string()
}

fn default_not_applicable() -> String {
    "N/A".to_string()
}

fn default_missing_tokens() -> Vec<String> {
    vec!["nan".to_string(), "none".to_string(), "null".to_string()]
}

fn default_max_results() -> usize {
    100
}

fn default_substitutions() -> Vec<Substitution> {
    [
        ("Usa", "United States"),
        ("U.S.A.", "United States"),
        ("Prc", "China"),
        ("People'S Republic Of China", "China"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| Substitution {
        pattern: pattern.to_string(),
        replacement: replacement.to_string(),
    })
    .collect()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            viewer_url: default_viewer_url(),
            expected_extension: default_expected_extension(),
            viewer_timeout_secs: default_viewer_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            max_age_days: default_max_age_days(),
            min_size_bytes: default_min_size_bytes(),
            file_name: default_reference_file(),
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            limit: default_usage_limit(),
            window_days: default_window_days(),
            file_name: default_usage_file(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            unknown_country: default_unknown_country(),
            not_applicable: default_not_applicable(),
            missing_tokens: default_missing_tokens(),
            max_results: default_max_results(),
            substitutions: default_substitutions(),
        }
    }
}

impl BackendConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BackendConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn reference_path(&self) -> PathBuf {
        self.data_dir.join(&self.reference.file_name)
    }

    pub fn usage_path(&self) -> PathBuf {
        self.data_dir.join(&self.usage.file_name)
    }
}
