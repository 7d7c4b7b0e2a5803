//! Spine, FOC and arrow matching

use super::{db_path, open_catalog, CmdResult};
use crate::settings::Settings;
use clap::Args;
use quiver_core::matching::{recommendation_report, MatchRequest};
use quiver_core::model::{BowConfiguration, BowType, CamType, RestType};
use quiver_core::spine::{calculate_foc, calculate_required_spine, FocInput, SpineRequest};
use quiver_engine::commands::matching::find_matching_arrows;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SpineArgs {
    /// compound, recurve or traditional
    #[arg(long)]
    pub bow_type: BowType,
    /// Pounds
    #[arg(long)]
    pub draw_weight: f64,
    /// Inches
    #[arg(long, default_value_t = 28.0)]
    pub draw_length: f64,
    /// Inches
    #[arg(long)]
    pub arrow_length: f64,
    /// Grains
    #[arg(long, default_value_t = 100.0)]
    pub point_weight: f64,
    #[arg(long)]
    pub cam: Option<CamType>,
    #[arg(long)]
    pub rest: Option<RestType>,
    #[arg(long)]
    pub material: Option<String>,
}

#[derive(Debug, Args)]
pub struct FocArgs {
    #[arg(long)]
    pub arrow_length: f64,
    #[arg(long)]
    pub point_weight: f64,
    #[arg(long)]
    pub shaft_weight: f64,
    #[arg(long, default_value_t = 10.0)]
    pub nock_weight: f64,
    #[arg(long, default_value_t = 15.0)]
    pub fletching_weight: f64,
    #[arg(long, default_value_t = 15.0)]
    pub insert_weight: f64,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    #[arg(long)]
    pub bow_type: BowType,
    #[arg(long)]
    pub draw_weight: f64,
    #[arg(long)]
    pub draw_length: f64,
    #[arg(long)]
    pub arrow_length: f64,
    #[arg(long, default_value_t = 100.0)]
    pub point_weight: f64,
    #[arg(long)]
    pub cam: Option<CamType>,
    #[arg(long)]
    pub rest: Option<RestType>,
    /// Preferred manufacturer; repeat for several
    #[arg(long = "prefer")]
    pub prefer: Vec<String>,
    #[arg(long)]
    pub material: Option<String>,
    /// target, hunting, 3d ...
    #[arg(long = "arrow-type")]
    pub arrow_type: Option<String>,
    /// Wood species when matching wood shafts
    #[arg(long)]
    pub wood_species: Option<String>,
    #[arg(long, default_value_t = 10)]
    pub max_results: usize,

    #[arg(long)]
    pub db: Option<PathBuf>,
}

fn bow_from(
    bow_type: BowType,
    draw_weight: f64,
    draw_length: f64,
    cam: Option<CamType>,
    rest: Option<RestType>,
) -> BowConfiguration {
    let mut bow = BowConfiguration::new(draw_weight, draw_length, bow_type);
    if let Some(cam) = cam {
        bow = bow.with_cam(cam);
    }
    if let Some(rest) = rest {
        bow = bow.with_rest(rest);
    }
    bow
}

pub fn execute_spine(args: SpineArgs) -> CmdResult {
    let bow = bow_from(
        args.bow_type,
        args.draw_weight,
        args.draw_length,
        args.cam,
        args.rest,
    );
    let mut request = SpineRequest::new(args.arrow_length).with_point_weight(args.point_weight);
    if let Some(material) = args.material {
        request = request.with_material(material);
    }

    let result = calculate_required_spine(&bow, &request)?;

    let unit = if result.is_pounds() { "#" } else { "" };
    println!("Bow: {} at {} lbs", result.bow_type, args.draw_weight);
    println!("Recommended spine: {}{}", result.calculated_spine, unit);
    println!(
        "Range: {}{} - {}{}",
        result.spine_range.minimum, unit, result.spine_range.maximum, unit
    );
    println!("Confidence: {}", result.confidence);
    for adjustment in &result.adjustments {
        println!("  {}: {:+}", adjustment.name, adjustment.value);
    }
    for note in &result.notes {
        println!("Note: {}", note);
    }
    Ok(())
}

pub fn execute_foc(args: FocArgs) -> CmdResult {
    let input = FocInput {
        arrow_length: args.arrow_length,
        point_weight: args.point_weight,
        shaft_weight: args.shaft_weight,
        nock_weight: args.nock_weight,
        fletching_weight: args.fletching_weight,
        insert_weight: args.insert_weight,
    };

    let result = calculate_foc(&input)?;

    println!("FOC: {:.2}%", result.foc_percentage);
    println!("Balance point: {:.3}\" from the nock end", result.balance_point);
    println!("Physical center: {:.3}\"", result.physical_center);
    println!("Total weight: {:.1} gr", result.total_weight);
    Ok(())
}

pub fn execute_match(args: MatchArgs, settings: &Settings) -> CmdResult {
    let conn = open_catalog(&db_path(args.db, settings))?;
    let bow = bow_from(
        args.bow_type,
        args.draw_weight,
        args.draw_length,
        args.cam,
        args.rest,
    );
    let mut request = MatchRequest::new(bow, args.arrow_length)
        .with_point_weight(args.point_weight)
        .with_preferred_manufacturers(args.prefer)
        .with_max_results(args.max_results);
    if let Some(material) = args.material {
        request = request.with_material(material);
    }
    request.arrow_type_preference = args.arrow_type;
    request.wood_species_preference = args.wood_species;

    let matches = find_matching_arrows(&conn, &request)?;

    println!("{}", recommendation_report(&matches, &request));
    Ok(())
}
