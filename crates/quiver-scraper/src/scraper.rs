//! Sequential, rate-limited scraping of one manufacturer's product pages

use crate::config::CrawlSettings;
use crate::errors::{io_error, Result};
use crate::extractor::ArrowExtractor;
use crate::fetch::PageFetcher;
use chrono::Utc;
use quiver_core::model::{ArrowSpecification, ScrapingResult, ScrapingSession};
use quiver_store::ArrowDocument;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Session bookkeeping plus every arrow extracted during it
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub session: ScrapingSession,
    pub arrows: Vec<ArrowSpecification>,
}

impl ScrapeOutcome {
    pub fn total_spine_options(&self) -> usize {
        self.arrows.iter().map(|a| a.spine_specifications.len()).sum()
    }
}

/// Files written by `Scraper::save_session`
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSession {
    pub session_file: PathBuf,
    pub processed_file: Option<PathBuf>,
}

/// Lowercased, filesystem-safe manufacturer name
pub fn file_stem(manufacturer: &str) -> String {
    let stem: String = manufacturer
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let stem = stem.trim_matches('_').to_string();
    if stem.is_empty() {
        "unknown".to_string()
    } else {
        stem
    }
}

fn random_delay(range: [f64; 2]) -> Duration {
    let (lo, hi) = (range[0].max(0.0), range[1].max(0.0));
    let secs = if hi > lo {
        rand::thread_rng().gen_range(lo..hi)
    } else {
        lo
    };
    Duration::from_secs_f64(secs)
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

pub struct Scraper {
    settings: CrawlSettings,
    fetcher: Box<dyn PageFetcher>,
    extractor: ArrowExtractor,
}

impl Scraper {
    pub fn new(settings: CrawlSettings, fetcher: Box<dyn PageFetcher>, extractor: ArrowExtractor) -> Self {
        Self {
            settings,
            fetcher,
            extractor,
        }
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Scrape the given URLs one at a time
    ///
    /// Failures are per URL and land in the session results; a page that
    /// yields no arrows counts as failed.
    pub async fn scrape_manufacturer(&self, manufacturer: &str, urls: &[String]) -> ScrapeOutcome {
        let mut session = ScrapingSession::start(manufacturer, Utc::now());
        let mut arrows = Vec::new();
        tracing::info!(manufacturer, urls = urls.len(), session_id = %session.session_id, "scrape started");

        for (index, url) in urls.iter().enumerate() {
            pause(random_delay(self.settings.delay_range)).await;
            let started = Instant::now();

            let result = match self.scrape_url(url, manufacturer).await {
                Ok(found) if found.is_empty() => ScrapingResult::failed(
                    url.as_str(),
                    "no arrow data extracted",
                    started.elapsed().as_secs_f64(),
                ),
                Ok(found) => {
                    let count = found.len();
                    arrows.extend(found);
                    ScrapingResult::succeeded(url.as_str(), count, started.elapsed().as_secs_f64())
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "url failed");
                    ScrapingResult::failed(url.as_str(), e.to_string(), started.elapsed().as_secs_f64())
                }
            };
            tracing::debug!(
                url = %url,
                success = result.success,
                arrows = result.arrows_found,
                "url processed"
            );
            session.record(result);

            if index + 1 < urls.len() {
                pause(Duration::from_secs_f64(self.settings.url_pause.max(0.0))).await;
            }
        }

        session.complete(Utc::now());
        tracing::info!(
            manufacturer,
            arrows = session.total_arrows_found,
            success_rate = session.success_rate(),
            "scrape finished"
        );
        ScrapeOutcome { session, arrows }
    }

    async fn scrape_url(&self, url: &str, manufacturer: &str) -> Result<Vec<ArrowSpecification>> {
        let text = self.fetcher.fetch_text(url).await?;
        self.extractor.extract(&text, url, manufacturer).await
    }

    /// Write `raw/{session_id}_session.json` and, when arrows were found,
    /// `processed/{manufacturer}_arrows.json`
    ///
    /// # Errors
    ///
    /// `Io` when a directory or file cannot be written.
    pub fn save_session(data_dir: &Path, outcome: &ScrapeOutcome) -> Result<SavedSession> {
        let raw_dir = data_dir.join("raw");
        std::fs::create_dir_all(&raw_dir).map_err(|e| io_error("save_session", e))?;
        let session_file = raw_dir.join(format!("{}_session.json", outcome.session.session_id));
        write_json(&session_file, &outcome.session)?;

        let processed_file = if outcome.arrows.is_empty() {
            None
        } else {
            let processed_dir = data_dir.join("processed");
            std::fs::create_dir_all(&processed_dir).map_err(|e| io_error("save_session", e))?;
            let path = processed_dir.join(format!("{}_arrows.json", file_stem(&outcome.session.manufacturer)));
            let document = ArrowDocument::from_specifications(&outcome.session.manufacturer, &outcome.arrows, Utc::now());
            write_json(&path, &document)?;
            Some(path)
        };

        tracing::info!(
            session_file = %session_file.display(),
            processed = processed_file.is_some(),
            "session saved"
        );
        Ok(SavedSession {
            session_file,
            processed_file,
        })
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        quiver_core::errors::ExError::new(quiver_core::errors::ExErrorKind::Serialization)
            .with_op("save_session")
            .with_entity_id(path.display().to_string())
            .with_message(e.to_string())
    })?;
    std::fs::write(path, text).map_err(|e| io_error("save_session", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockPageFetcher;
    use crate::llm::LlmClient;
    use async_trait::async_trait;
    use quiver_core::errors::{ExError, ExErrorKind};

    struct MockLlm;

    #[async_trait]
    impl LlmClient for MockLlm {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(r#"{"arrows":[{"model_name":"Hunter XT","spine_options":[300,340],"diameter":0.298,"gpi_weight":9.3}]}"#.to_string())
        }
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Easton Archery"), "easton_archery");
        assert_eq!(file_stem(" Gold-Tip "), "gold_tip");
        assert_eq!(file_stem("!!"), "unknown");
    }

    #[test]
    fn test_random_delay_within_range() {
        for _ in 0..20 {
            let d = random_delay([0.5, 1.0]).as_secs_f64();
            assert!((0.5..=1.0).contains(&d));
        }
        assert!(random_delay([0.0, 0.0]).is_zero());
    }

    #[tokio::test]
    async fn test_scrape_records_failures_per_url() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_text()
            .withf(|url| url.ends_with("/hunter"))
            .returning(|_| Ok("Hunter XT spine 300 340 diameter 0.298".to_string()));
        fetcher
            .expect_fetch_text()
            .withf(|url| url.ends_with("/gone"))
            .returning(|url| {
                Err(ExError::new(ExErrorKind::ExternalService)
                    .with_op("fetch_page")
                    .with_entity_id(url.to_string())
                    .with_message("404 Not Found"))
            });

        let scraper = Scraper::new(
            CrawlSettings::without_delays(),
            Box::new(fetcher),
            ArrowExtractor::new(Box::new(MockLlm)),
        );
        let urls = vec![
            "https://goldtip.test/hunter".to_string(),
            "https://goldtip.test/gone".to_string(),
        ];

        let outcome = scraper.scrape_manufacturer("Gold Tip", &urls).await;

        assert_eq!(outcome.arrows.len(), 1);
        assert_eq!(outcome.total_spine_options(), 2);
        assert_eq!(outcome.session.success_rate(), 50.0);
        assert_eq!(outcome.session.failed_urls(), vec!["https://goldtip.test/gone"]);
        assert!(outcome.session.completed_at.is_some());
    }
}
