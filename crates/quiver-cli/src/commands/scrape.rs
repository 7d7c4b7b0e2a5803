//! Manufacturer scraping

use super::{db_path, open_catalog, CmdResult};
use crate::settings::Settings;
use clap::Args;
use quiver_engine::commands::update::update_all;
use quiver_scraper::{
    ArrowExtractor, HttpFetcher, OpenAiCompatibleClient, Scraper, ScraperConfig,
};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Manufacturer name; partial names are accepted
    #[arg(conflicts_with_all = ["all", "list"])]
    pub manufacturer: Option<String>,

    /// Scrape every manufacturer and import the results
    #[arg(long)]
    pub all: bool,

    /// With --all, rescrape manufacturers already in the catalog
    #[arg(long, requires = "all")]
    pub force: bool,

    /// List configured manufacturers
    #[arg(long)]
    pub list: bool,

    /// Manufacturers YAML (default: from settings)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub fn execute(args: ScrapeArgs, settings: &Settings) -> CmdResult {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| settings.manufacturers_config.clone());
    let config = ScraperConfig::load(&config_path)?;

    if args.list {
        println!(
            "{} manufacturer(s), {} URL(s)",
            config.manufacturers.len(),
            config.total_urls()
        );
        for name in config.names() {
            println!("  {} ({} URL(s))", name, config.urls(name).len());
        }
        return Ok(());
    }

    if !args.all && args.manufacturer.is_none() {
        return Err("Must specify a manufacturer, --all or --list".into());
    }

    let scraper = build_scraper(&config, settings)?;
    let runtime = tokio::runtime::Runtime::new()?;

    if args.all {
        let mut conn = open_catalog(&db_path(args.db, settings))?;
        let summary = runtime.block_on(update_all(
            &mut conn,
            &config,
            &scraper,
            args.force,
            &settings.data_dir,
        ))?;

        println!(
            "✓ Scraped {} manufacturer(s) in {:.1}s: {} arrows found, {} imported",
            summary.manufacturers_processed,
            summary.duration_secs,
            summary.arrows_found,
            summary.arrows_imported
        );
        if !summary.manufacturers_skipped.is_empty() {
            println!("Skipped: {}", summary.manufacturers_skipped.join(", "));
        }
        for url in &summary.failed_urls {
            println!("Failed URL: {}", url);
        }
        return Ok(());
    }

    let requested = args.manufacturer.unwrap_or_default();
    let name = config
        .manufacturer(&requested)
        .map(|_| requested.as_str())
        .or_else(|| config.find_by_partial_name(&requested))
        .ok_or_else(|| format!("manufacturer '{}' is not configured", requested))?
        .to_string();
    let urls = config.urls(&name);
    if urls.is_empty() {
        return Err(format!("manufacturer '{}' has no product URLs", name).into());
    }

    let outcome = runtime.block_on(scraper.scrape_manufacturer(&name, urls));
    let saved = Scraper::save_session(&settings.data_dir, &outcome)?;

    println!(
        "✓ {}: {} arrow(s), {} spine option(s) from {} URL(s)",
        name,
        outcome.arrows.len(),
        outcome.total_spine_options(),
        urls.len()
    );
    println!("Session: {}", saved.session_file.display());
    if let Some(processed) = &saved.processed_file {
        println!("Processed: {}", processed.display());
    }
    for url in outcome.session.failed_urls() {
        println!("Failed URL: {}", url);
    }
    Ok(())
}

fn build_scraper(
    config: &ScraperConfig,
    settings: &Settings,
) -> Result<Scraper, Box<dyn std::error::Error>> {
    let fetcher = HttpFetcher::new(&config.settings)?;
    let client = OpenAiCompatibleClient::new(settings.llm_settings()?)?;
    tracing::debug!(model = client.model(), "LLM client ready");
    Ok(Scraper::new(
        config.settings.clone(),
        Box::new(fetcher),
        ArrowExtractor::new(Box::new(client)),
    ))
}
