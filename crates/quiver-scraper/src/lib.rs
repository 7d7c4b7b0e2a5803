//! Quiver Scraper - manufacturer page crawling and LLM extraction
//!
//! Provides:
//! - Manufacturer crawl configuration (YAML)
//! - HTML to text reduction and spec-focused excerpts
//! - An OpenAI-compatible chat client and the arrow extractor built on it
//! - A polite sequential scraper that writes session and processed files

pub mod config;
pub mod errors;
pub mod extractor;
pub mod fetch;
pub mod llm;
pub mod scraper;
pub mod text;

pub use config::{CrawlSettings, ManufacturerConfig, ScraperConfig};
pub use extractor::ArrowExtractor;
pub use fetch::{HttpFetcher, PageFetcher};
pub use llm::{LlmClient, LlmSettings, OpenAiCompatibleClient};
pub use scraper::{SavedSession, ScrapeOutcome, Scraper};
