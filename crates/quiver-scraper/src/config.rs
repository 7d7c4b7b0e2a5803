//! Manufacturer crawl configuration
//!
//! Loaded from a YAML file shaped like:
//!
//! ```yaml
//! manufacturers:
//!   Easton Archery:
//!     base_url: https://eastonarchery.com
//!     product_urls:
//!       - https://eastonarchery.com/arrows/axis
//!     extraction_method: text
//!     language: english
//! settings:
//!   delay_range: [1, 3]
//!   max_retries: 3
//! ```

use crate::errors::{config_error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "ArrowScraper/1.0 (Educational Research)";

fn default_extraction_method() -> String {
    "text".to_string()
}

fn default_language() -> String {
    "english".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturerConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub product_urls: Vec<String>,
    #[serde(default = "default_extraction_method")]
    pub extraction_method: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Politeness and retry settings shared by every manufacturer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Seconds; a random delay in this range precedes each page
    pub delay_range: [f64; 2],
    pub max_retries: u32,
    /// Request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
    /// Seconds between pages of one manufacturer
    pub url_pause: f64,
    /// Seconds between manufacturers in a full update
    pub manufacturer_pause: f64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            delay_range: [1.0, 3.0],
            max_retries: 3,
            timeout: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            url_pause: 2.0,
            manufacturer_pause: 5.0,
        }
    }
}

impl CrawlSettings {
    /// Settings with every pause set to zero
    pub fn without_delays() -> Self {
        Self {
            delay_range: [0.0, 0.0],
            url_pause: 0.0,
            manufacturer_pause: 0.0,
            ..Self::default()
        }
    }
}

impl CrawlSettings {
    fn check_pauses(&self) -> Result<()> {
        let pauses = [
            ("delay_range", self.delay_range[0]),
            ("delay_range", self.delay_range[1]),
            ("url_pause", self.url_pause),
            ("manufacturer_pause", self.manufacturer_pause),
        ];
        for (field, secs) in pauses {
            if secs.is_nan() || Duration::try_from_secs_f64(secs.max(0.0)).is_err() {
                return Err(config_error(format!(
                    "Invalid {field} in config file: {secs} is not a usable number of seconds"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub manufacturers: BTreeMap<String, ManufacturerConfig>,
    #[serde(default)]
    pub settings: CrawlSettings,
}

impl ScraperConfig {
    /// # Errors
    ///
    /// `Configuration` when the file is missing or is not valid YAML.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(config_error(format!(
                "Manufacturers config not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("Error loading config: {e}")))?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(
            manufacturers = config.manufacturers.len(),
            path = %path.display(),
            "scraper config loaded"
        );
        Ok(config)
    }

    /// # Errors
    ///
    /// `Configuration` for invalid YAML or a pause that cannot become a `Duration`.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| config_error(format!("Invalid YAML in config file: {e}")))?;
        config.settings.check_pauses()?;
        Ok(config)
    }

    /// Manufacturer names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.manufacturers.keys().map(String::as_str).collect()
    }

    pub fn manufacturer(&self, name: &str) -> Option<&ManufacturerConfig> {
        self.manufacturers.get(name)
    }

    pub fn urls(&self, name: &str) -> &[String] {
        self.manufacturer(name)
            .map(|m| m.product_urls.as_slice())
            .unwrap_or(&[])
    }

    /// First manufacturer whose name contains `partial`, case-insensitively
    pub fn find_by_partial_name(&self, partial: &str) -> Option<&str> {
        let needle = partial.to_lowercase();
        self.names()
            .into_iter()
            .find(|name| name.to_lowercase().contains(&needle))
    }

    pub fn extraction_method(&self, name: &str) -> &str {
        self.manufacturer(name)
            .map(|m| m.extraction_method.as_str())
            .unwrap_or("text")
    }

    pub fn language(&self, name: &str) -> &str {
        self.manufacturer(name)
            .map(|m| m.language.as_str())
            .unwrap_or("english")
    }

    pub fn total_urls(&self) -> usize {
        self.manufacturers.values().map(|m| m.product_urls.len()).sum()
    }
}
