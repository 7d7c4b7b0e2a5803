// Integration tests for scraping sessions: fetch, extract, save, import

use async_trait::async_trait;
use quiver_core::errors::{ExError, ExErrorKind};
use quiver_scraper::errors::Result;
use quiver_scraper::{ArrowExtractor, CrawlSettings, LlmClient, PageFetcher, Scraper};
use quiver_store::repo::ArrowRepo;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct FakeFetcher {
    pages: HashMap<String, String>,
}

impl FakeFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.pages.get(url).cloned().ok_or_else(|| {
            ExError::new(ExErrorKind::ExternalService)
                .with_op("fetch_page")
                .with_entity_id(url)
                .with_message("404 Not Found")
        })
    }
}

/// Answers by looking for a known model name in the prompt
struct FakeLlm {
    answers: Vec<(&'static str, &'static str)>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmClient for FakeLlm {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .answers
            .iter()
            .find(|(needle, _)| prompt.contains(needle))
            .map(|(_, answer)| answer.to_string())
            .unwrap_or_else(|| "no arrows here".to_string()))
    }
}

const AXIS_ANSWER: &str = r#"```json
{"arrows": [{"model_name": "Axis 4mm", "spine_options": [300, 340, 400],
  "diameter": 0.204, "inner_diameter": 0.166, "gpi_weight": 9.5,
  "length_options": [30, 31, 32], "material": "Carbon", "arrow_type": "hunting",
  "recommended_use": ["hunting", "3d"], "description": "Micro diameter hunting shaft."}]}
```"#;

const FMJ_ANSWER: &str = r#"{"arrows": [{"model_name": "FMJ 5mm", "spine_options": ["250", "300"],
  "diameter": 0.250, "gpi_weight": 13.0, "material": "Carbon / Aluminum"}]}"#;

fn scraper(fetcher: FakeFetcher, calls: Arc<AtomicUsize>) -> Scraper {
    let llm = FakeLlm {
        answers: vec![("Axis 4mm", AXIS_ANSWER), ("FMJ 5mm", FMJ_ANSWER)],
        calls,
    };
    Scraper::new(
        CrawlSettings::without_delays(),
        Box::new(fetcher),
        ArrowExtractor::new(Box::new(llm)),
    )
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn test_scrape_collects_arrows_and_failures() {
    // Given two product pages, one empty page and one missing page
    let fetcher = FakeFetcher::new(&[
        ("https://easton.test/axis", "Axis 4mm\nSpine 300 340 400\nOD 0.204"),
        ("https://easton.test/fmj", "FMJ 5mm\nSpine 250 300\n13.0 gpi"),
        ("https://easton.test/about", "About our company"),
    ]);
    let calls = Arc::new(AtomicUsize::new(0));
    let scraper = scraper(fetcher, calls.clone());
    let list = urls(&[
        "https://easton.test/axis",
        "https://easton.test/fmj",
        "https://easton.test/about",
        "https://easton.test/missing",
    ]);

    // When scraping the manufacturer
    let outcome = scraper.scrape_manufacturer("Easton Archery", &list).await;

    // Then both products are extracted and the other pages are failures
    assert_eq!(outcome.arrows.len(), 2);
    assert_eq!(outcome.total_spine_options(), 5);
    assert_eq!(outcome.session.total_arrows_found, 2);
    assert_eq!(outcome.session.results.len(), 4);
    assert_eq!(
        outcome.session.failed_urls(),
        vec!["https://easton.test/about", "https://easton.test/missing"]
    );
    assert_eq!(outcome.session.success_rate(), 50.0);
    // The missing page never reaches the LLM
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let axis = &outcome.arrows[0];
    assert_eq!(axis.manufacturer, "Easton Archery");
    assert_eq!(axis.source_url, "https://easton.test/axis");
    assert_eq!(axis.spine_specifications[0].inner_diameter, Some(0.166));
}

#[tokio::test]
async fn test_saved_session_imports_into_store() {
    // Given a finished scrape
    let dir = TempDir::new().unwrap();
    let fetcher = FakeFetcher::new(&[("https://easton.test/axis", "Axis 4mm\nSpine 300 340 400")]);
    let scraper = scraper(fetcher, Arc::new(AtomicUsize::new(0)));
    let outcome = scraper
        .scrape_manufacturer("Easton Archery", &urls(&["https://easton.test/axis"]))
        .await;

    // When saving it and importing the processed directory
    let saved = Scraper::save_session(dir.path(), &outcome).unwrap();
    let mut conn = Connection::open_in_memory().unwrap();
    quiver_store::migrations::apply_migrations(&mut conn).unwrap();
    let summary = quiver_store::import_directory(&mut conn, &dir.path().join("processed")).unwrap();

    // Then both files exist and the arrow lands in the database
    assert!(saved.session_file.exists());
    let processed = saved.processed_file.unwrap();
    assert!(processed.ends_with("processed/easton_archery_arrows.json"));
    let session_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&saved.session_file).unwrap()).unwrap();
    assert_eq!(session_json["manufacturer"], "Easton Archery");
    assert_eq!(session_json["total_arrows_found"], 1);

    assert_eq!(summary.arrows_inserted, 1);
    assert_eq!(summary.specs_added, 3);
    assert_eq!(ArrowRepo::count_for_manufacturer(&conn, "Easton Archery").unwrap(), 1);
}

#[tokio::test]
async fn test_session_without_arrows_writes_no_processed_file() {
    // Given a scrape where every page fails
    let dir = TempDir::new().unwrap();
    let scraper = scraper(FakeFetcher::new(&[]), Arc::new(AtomicUsize::new(0)));
    let outcome = scraper
        .scrape_manufacturer("Nobody", &urls(&["https://nobody.test/"]))
        .await;

    // When saving the session
    let saved = Scraper::save_session(dir.path(), &outcome).unwrap();

    // Then only the raw session file is written
    assert!(saved.session_file.exists());
    assert!(saved.processed_file.is_none());
    assert!(!dir.path().join("processed").exists());
}
