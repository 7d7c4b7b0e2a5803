//! Import, search, show and stats

use super::{db_path, open_catalog, or_na, CmdResult};
use crate::settings::Settings;
use clap::Args;
use quiver_core::model::DiameterCategory;
use quiver_engine::commands::catalog::{
    arrow_details, catalog_statistics, import_processed, search_arrows,
};
use quiver_store::repo::SearchQuery;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Directory of processed JSON files (default: <data_dir>/processed)
    pub dir: Option<PathBuf>,

    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub manufacturer: Option<String>,
    #[arg(long = "type")]
    pub arrow_type: Option<String>,
    #[arg(long)]
    pub material: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub spine_min: Option<i64>,
    #[arg(long)]
    pub spine_max: Option<i64>,
    #[arg(long)]
    pub gpi_min: Option<f64>,
    #[arg(long)]
    pub gpi_max: Option<f64>,
    #[arg(long)]
    pub diameter_min: Option<f64>,
    #[arg(long)]
    pub diameter_max: Option<f64>,
    /// Diameter category, e.g. standard_target
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: i64,

    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub fn execute_import(args: ImportArgs, settings: &Settings) -> CmdResult {
    let mut conn = open_catalog(&db_path(args.db, settings))?;
    let dir = args.dir.unwrap_or_else(|| settings.processed_dir());

    let summary = import_processed(&mut conn, &dir)?;

    println!(
        "✓ Imported {} file(s): {} new, {} updated, {} unchanged arrows, {} spine specs",
        summary.files_processed,
        summary.arrows_inserted,
        summary.arrows_updated,
        summary.arrows_unchanged,
        summary.specs_added
    );
    if summary.files_skipped > 0 {
        println!("Skipped {} file(s)", summary.files_skipped);
    }
    for error in &summary.errors {
        println!("Failed {}: {}", error.file, error.error);
    }
    Ok(())
}

pub fn execute_search(args: SearchArgs, settings: &Settings) -> CmdResult {
    let conn = open_catalog(&db_path(args.db, settings))?;
    let diameter_category = match args.category.as_deref() {
        Some(name) => Some(
            DiameterCategory::parse(name)
                .ok_or_else(|| format!("unknown diameter category '{}'", name))?,
        ),
        None => None,
    };
    let query = SearchQuery {
        manufacturer: args.manufacturer,
        arrow_type: args.arrow_type,
        material: args.material,
        model: args.model,
        spine_min: args.spine_min,
        spine_max: args.spine_max,
        gpi_min: args.gpi_min,
        gpi_max: args.gpi_max,
        diameter_min: args.diameter_min,
        diameter_max: args.diameter_max,
        diameter_category,
        limit: Some(args.limit),
    };

    let arrows = search_arrows(&conn, &query)?;

    println!("Found {} arrow(s)", arrows.len());
    for arrow in &arrows {
        println!(
            "[{}] {} {} | {} | spine {} | {} spec(s)",
            arrow.id,
            arrow.manufacturer,
            arrow.model_name,
            arrow.material.as_deref().unwrap_or("unknown material"),
            arrow.spine_display,
            arrow.spine_count
        );
    }
    Ok(())
}

pub fn execute_show(args: ShowArgs, settings: &Settings) -> CmdResult {
    let conn = open_catalog(&db_path(args.db, settings))?;
    let arrow = arrow_details(&conn, args.id)?;

    println!("{} {}", arrow.manufacturer, arrow.model_name);
    println!("Material: {}", or_na(arrow.material.as_deref()));
    println!("Type: {}", or_na(arrow.arrow_type.as_deref()));
    if let Some(description) = &arrow.description {
        println!("Description: {}", description);
    }
    if let Some(url) = &arrow.source_url {
        println!("Source: {}", url);
    }
    println!("Spine specifications:");
    for spec in &arrow.spine_specifications {
        println!(
            "  spine {} | OD {} | ID {} | GPI {} | {}",
            or_na(spec.spine),
            or_na(spec.outer_diameter),
            or_na(spec.inner_diameter),
            or_na(spec.gpi_weight),
            spec.diameter_category.map_or("uncategorised", |c| c.label())
        );
    }
    Ok(())
}

pub fn execute_stats(args: StatsArgs, settings: &Settings) -> CmdResult {
    let conn = open_catalog(&db_path(args.db, settings))?;
    let stats = catalog_statistics(&conn)?;

    println!("Arrows: {}", stats.total_arrows);
    println!("Spine specifications: {}", stats.total_specifications);
    println!("Manufacturers: {}", stats.total_manufacturers);
    println!(
        "Spine range: {} - {}",
        or_na(stats.spine_range.0),
        or_na(stats.spine_range.1)
    );
    println!(
        "GPI range: {} - {}",
        or_na(stats.gpi_range.0),
        or_na(stats.gpi_range.1)
    );
    println!(
        "Diameter range: {} - {}",
        or_na(stats.diameter_range.0),
        or_na(stats.diameter_range.1)
    );
    for m in &stats.manufacturers {
        println!("  {}: {} arrows, {} specs", m.manufacturer, m.arrow_count, m.spec_count);
    }
    for c in &stats.diameter_categories {
        println!("  {}: {}", c.diameter_category, c.count);
    }
    Ok(())
}
