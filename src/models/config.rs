// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration, loaded from TOML. Credentials are
/// deliberately not part of this file; see [`Credentials`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Browser/session behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Spreadsheet sink settings
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Backup file and ledger locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Digest mail settings
    #[serde(default)]
    pub mail: MailConfig,

    /// Which sources this run covers
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.webdriver_timeout_secs == 0 {
            return Err(AppError::config("crawler.webdriver_timeout_secs must be > 0"));
        }
        if self.crawler.retry_attempts == 0 {
            return Err(AppError::config("crawler.retry_attempts must be > 0"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::config("crawler.max_pages must be > 0"));
        }
        if self.sheets.enabled && self.sheets.spreadsheet_id.trim().is_empty() {
            return Err(AppError::config(
                "sheets.spreadsheet_id is required when sheets.enabled",
            ));
        }
        if self.output.download_dir.trim().is_empty() {
            return Err(AppError::config("output.download_dir is empty"));
        }
        if !self.sources.rulings && !self.sources.updates {
            return Err(AppError::config("no sources enabled"));
        }
        Ok(())
    }
}

/// Browser automation and retry behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// WebDriver endpoint (chromedriver/geckodriver)
    #[serde(default = "defaults::webdriver_url")]
    pub webdriver_url: String,

    /// Bounded wait for any element, in seconds
    #[serde(default = "defaults::webdriver_timeout")]
    pub webdriver_timeout_secs: u64,

    /// Settle delay after navigation, in milliseconds
    #[serde(default = "defaults::page_load_wait")]
    pub page_load_wait_ms: u64,

    /// Retry attempts for transient failures
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay for exponential backoff, in milliseconds
    #[serde(default = "defaults::retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Hard cap on listing pages per source
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Maximum length of any extracted text field, in graphemes
    #[serde(default = "defaults::max_field_len")]
    pub max_field_len: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::webdriver_url(),
            webdriver_timeout_secs: defaults::webdriver_timeout(),
            page_load_wait_ms: defaults::page_load_wait(),
            retry_attempts: defaults::retry_attempts(),
            retry_base_delay_ms: defaults::retry_base_delay(),
            max_pages: defaults::max_pages(),
            max_field_len: defaults::max_field_len(),
        }
    }
}

/// Spreadsheet sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default = "defaults::sheets_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub spreadsheet_id: String,

    /// Sheets API base; overridable for tests
    #[serde(default = "defaults::sheets_api_base")]
    pub api_base: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::sheets_enabled(),
            spreadsheet_id: String::new(),
            api_base: defaults::sheets_api_base(),
        }
    }
}

/// Backup file and ledger locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for per-run backup files
    #[serde(default = "defaults::download_dir")]
    pub download_dir: String,

    /// Identity ledger file
    #[serde(default = "defaults::ledger_path")]
    pub ledger_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: defaults::download_dir(),
            ledger_path: defaults::ledger_path(),
        }
    }
}

/// Digest mail settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub recipients: Vec<String>,

    #[serde(default = "defaults::subject_prefix")]
    pub subject_prefix: String,
}

/// Which sources this run covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "defaults::enabled")]
    pub rulings: bool,

    #[serde(default = "defaults::enabled")]
    pub updates: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            rulings: defaults::enabled(),
            updates: defaults::enabled(),
        }
    }
}

/// Secrets resolved from the environment, never from the config file.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub rulings_username: String,
    pub rulings_password: String,
    pub updates_email: String,
    pub updates_password: String,
    /// OAuth bearer token for the sheet append
    pub sheets_token: String,
}

impl Credentials {
    /// Read credentials from the environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            rulings_username: var("TAXSUTRA_USERNAME"),
            rulings_password: var("TAXSUTRA_PASSWORD"),
            updates_email: var("TAXMANN_EMAIL"),
            updates_password: var("TAXMANN_PASSWORD"),
            sheets_token: var("SHEETS_TOKEN"),
        }
    }

    /// Validate that every credential an enabled feature needs is present.
    pub fn validate(&self, config: &Config) -> Result<()> {
        let mut missing = Vec::new();
        if config.sources.rulings {
            if self.rulings_username.is_empty() {
                missing.push("TAXSUTRA_USERNAME");
            }
            if self.rulings_password.is_empty() {
                missing.push("TAXSUTRA_PASSWORD");
            }
        }
        if config.sources.updates {
            if self.updates_email.is_empty() {
                missing.push("TAXMANN_EMAIL");
            }
            if self.updates_password.is_empty() {
                missing.push("TAXMANN_PASSWORD");
            }
        }
        if config.sheets.enabled && self.sheets_token.is_empty() {
            missing.push("SHEETS_TOKEN");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}

mod defaults {
    pub fn webdriver_url() -> String {
        "http://localhost:9515".into()
    }
    pub fn webdriver_timeout() -> u64 {
        8
    }
    pub fn page_load_wait() -> u64 {
        1500
    }
    pub fn retry_attempts() -> u32 {
        3
    }
    pub fn retry_base_delay() -> u64 {
        500
    }
    pub fn max_pages() -> usize {
        20
    }
    pub fn max_field_len() -> usize {
        20_000
    }
    pub fn sheets_enabled() -> bool {
        true
    }
    pub fn sheets_api_base() -> String {
        "https://sheets.googleapis.com/v4/spreadsheets".into()
    }
    pub fn download_dir() -> String {
        "downloads".into()
    }
    pub fn ledger_path() -> String {
        "downloads/ledger.json".into()
    }
    pub fn subject_prefix() -> String {
        "Daily Tax Rulings".into()
    }
    pub fn enabled() -> bool {
        true
    }
}
