//! Full catalog refresh: scrape every configured manufacturer and import
//! what was found.
//!
//! ## Logging Ownership
//!
//! `update_all` logs the run lifecycle and one `info!` per manufacturer.
//! Per-URL progress is logged by the scraper.

#![allow(clippy::result_large_err)]

use chrono::Utc;
use quiver_core::{log_op_end, log_op_error, log_op_start};
use quiver_scraper::{ScraperConfig, Scraper};
use quiver_store::errors::Result;
use quiver_store::import::import_document;
use quiver_store::repo::ArrowRepo;
use quiver_store::ArrowDocument;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

/// Totals for one `update_all` run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSummary {
    /// Manufacturers that were scraped
    pub manufacturers_processed: usize,
    /// Already in the catalog, or no URLs configured
    pub manufacturers_skipped: Vec<String>,
    /// Scraped with at least one arrow found
    pub manufacturers_successful: usize,
    pub arrows_found: usize,
    pub arrows_imported: usize,
    pub failed_urls: Vec<String>,
    pub duration_secs: f64,
}

/// Scrape and import every manufacturer in `config`, in name order
///
/// ## Arguments
///
/// - `conn`: Database connection
/// - `config`: Manufacturer URLs and crawl settings
/// - `scraper`: Fetches and extracts pages
/// - `force`: Scrape manufacturers that already have arrows
/// - `data_dir`: Receives `raw/` session files and `processed/` arrow files
///
/// ## Errors
///
/// - `Io`: Session or processed file cannot be written
/// - `Persistence`: Database error during import
pub async fn update_all(
    conn: &mut Connection,
    config: &ScraperConfig,
    scraper: &Scraper,
    force: bool,
    data_dir: &Path,
) -> Result<UpdateSummary> {
    log_op_start!(
        "update_all",
        manufacturers = config.manufacturers.len(),
        force = force
    );
    let start = Instant::now();

    let summary = update_all_impl(conn, config, scraper, force, data_dir, start)
        .await
        .map_err(|e| {
            log_op_error!(
                "update_all",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "update_all",
        duration_ms = start.elapsed().as_millis() as u64,
        processed = summary.manufacturers_processed,
        arrows_imported = summary.arrows_imported
    );
    Ok(summary)
}

async fn update_all_impl(
    conn: &mut Connection,
    config: &ScraperConfig,
    scraper: &Scraper,
    force: bool,
    data_dir: &Path,
    start: Instant,
) -> Result<UpdateSummary> {
    let mut summary = UpdateSummary::default();
    let pause = Duration::from_secs_f64(config.settings.manufacturer_pause.max(0.0));
    let mut scraped_any = false;

    for name in config.names() {
        let existing = ArrowRepo::count_for_manufacturer(conn, name)?;
        if existing > 0 && !force {
            tracing::info!(manufacturer = name, existing, "skipping, already in catalog");
            summary.manufacturers_skipped.push(name.to_string());
            continue;
        }
        let urls = config.urls(name);
        if urls.is_empty() {
            tracing::warn!(manufacturer = name, "skipping, no URLs configured");
            summary.manufacturers_skipped.push(name.to_string());
            continue;
        }

        if scraped_any && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        scraped_any = true;

        let outcome = scraper.scrape_manufacturer(name, urls).await;
        summary.manufacturers_processed += 1;
        summary.arrows_found += outcome.arrows.len();
        summary
            .failed_urls
            .extend(outcome.session.failed_urls().into_iter().map(str::to_string));

        Scraper::save_session(data_dir, &outcome)?;
        if outcome.arrows.is_empty() {
            tracing::warn!(manufacturer = name, "no arrows found");
            continue;
        }
        summary.manufacturers_successful += 1;

        let document = ArrowDocument::from_specifications(name, &outcome.arrows, Utc::now());
        let imported = import_document(conn, &document)?;
        summary.arrows_imported += imported.arrows_imported();
        tracing::info!(
            manufacturer = name,
            found = outcome.arrows.len(),
            imported = imported.arrows_imported(),
            success_rate = outcome.session.success_rate(),
            "manufacturer updated"
        );
    }

    summary.duration_secs = start.elapsed().as_secs_f64();
    Ok(summary)
}
