//! Bookkeeping for one scrape run over a manufacturer's URLs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of scraping a single URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingResult {
    pub success: bool,
    pub url: String,
    pub arrows_found: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    pub processing_time_secs: f64,
}

impl ScrapingResult {
    pub fn succeeded(url: impl Into<String>, arrows_found: usize, processing_time_secs: f64) -> Self {
        Self {
            success: true,
            url: url.into(),
            arrows_found,
            errors: Vec::new(),
            processing_time_secs,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>, processing_time_secs: f64) -> Self {
        Self {
            success: false,
            url: url.into(),
            arrows_found: 0,
            errors: vec![error.into()],
            processing_time_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingSession {
    pub session_id: String,
    pub manufacturer: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub urls_scraped: Vec<String>,
    pub total_arrows_found: usize,
    pub results: Vec<ScrapingResult>,
}

impl ScrapingSession {
    pub fn start(manufacturer: impl Into<String>, now: DateTime<Utc>) -> Self {
        let manufacturer = manufacturer.into();
        Self {
            session_id: session_id(&manufacturer, now),
            manufacturer,
            started_at: now,
            completed_at: None,
            urls_scraped: Vec::new(),
            total_arrows_found: 0,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, result: ScrapingResult) {
        self.urls_scraped.push(result.url.clone());
        self.total_arrows_found += result.arrows_found;
        self.results.push(result);
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.completed_at = Some(now);
    }

    /// Percentage of successful URLs; 0 when nothing was scraped
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let ok = self.results.iter().filter(|r| r.success).count();
        ok as f64 / self.results.len() as f64 * 100.0
    }

    pub fn failed_urls(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.url.as_str())
            .collect()
    }
}

/// `{manufacturer}_{YYYYmmdd_HHMMSS}`
pub fn session_id(manufacturer: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", manufacturer, now.format("%Y%m%d_%H%M%S"))
}
