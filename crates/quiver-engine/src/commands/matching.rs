//! Arrow matching against the catalog.
//!
//! Scoring is pure and lives in `quiver_core::matching`; this module runs
//! the catalog searches, the relaxation passes and the final diversity
//! ordering.
//!
//! ## Logging Ownership
//!
//! `find_matching_arrows` logs start/end/error; each search pass is a
//! `debug!` event.

#![allow(clippy::result_large_err)]

use quiver_core::matching::{
    diversify, evaluate_arrow, wood_species_manufacturers, ArrowMatch, MatchRequest,
};
use quiver_core::spine::{calculate_required_spine, SpineResult};
use quiver_core::{log_op_end, log_op_error, log_op_start};
use quiver_store::errors::Result;
use quiver_store::repo::{ArrowRepo, ArrowSummary, SearchQuery};
use rusqlite::Connection;
use std::collections::HashSet;

/// Find catalog arrows that suit the bow and build in `request`
///
/// ## Arguments
///
/// - `conn`: Database connection
/// - `request`: Bow configuration, arrow build and preferences
///
/// ## Returns
///
/// At most `request.max_results` matches, best first, with up to three
/// strong matches per manufacturer ahead of the rest.
///
/// ## Errors
///
/// - `InvalidInput`: Draw weight or arrow length is not positive
/// - `Persistence`: Database error
pub fn find_matching_arrows(conn: &Connection, request: &MatchRequest) -> Result<Vec<ArrowMatch>> {
    log_op_start!(
        "find_matching_arrows",
        bow_type = request.bow.bow_type.as_str(),
        draw_weight = request.bow.draw_weight,
        arrow_length = request.arrow_length
    );
    let start = std::time::Instant::now();

    let matches = find_matching_arrows_impl(conn, request).map_err(|e| {
        log_op_error!(
            "find_matching_arrows",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "find_matching_arrows",
        duration_ms = start.elapsed().as_millis() as u64,
        matches = matches.len()
    );
    Ok(matches)
}

fn find_matching_arrows_impl(conn: &Connection, request: &MatchRequest) -> Result<Vec<ArrowMatch>> {
    let spine = calculate_required_spine(&request.bow, &request.spine_request())?;
    let expansion = MatchRequest::spine_expansion(spine.spine_units);
    tracing::debug!(
        calculated_spine = spine.calculated_spine,
        minimum = spine.spine_range.minimum,
        maximum = spine.spine_range.maximum,
        expansion,
        "spine calculated"
    );

    let candidates = candidates(conn, request, &spine, expansion)?;
    let mut matches = score(conn, &candidates, &spine, request, request.min_spine_requirement())?;

    if matches.is_empty() && !candidates.is_empty() {
        tracing::debug!(candidates = candidates.len(), "relaxing spine option requirement");
        matches = score(conn, &candidates, &spine, request, 1)?;
    }

    if matches.is_empty() {
        let widened = ArrowRepo::search(conn, &primary_query(request, &spine, expansion * 2))?;
        tracing::debug!(candidates = widened.len(), "widened spine search");
        matches = score(conn, &widened, &spine, request, 1)?;
    }

    Ok(diversify(matches, request.max_results))
}

fn primary_query(request: &MatchRequest, spine: &SpineResult, expansion: i64) -> SearchQuery {
    SearchQuery {
        manufacturer: request.manufacturer_filter(),
        arrow_type: request.arrow_type_filter(),
        material: request.material_filter(),
        spine_min: Some(spine.spine_range.minimum - expansion),
        spine_max: Some(spine.spine_range.maximum + expansion),
        diameter_min: request.target_diameter_range.map(|(lo, _)| lo),
        diameter_max: request.target_diameter_range.map(|(_, hi)| hi),
        gpi_min: request.target_weight_range.map(|(lo, _)| lo),
        gpi_max: request.target_weight_range.map(|(_, hi)| hi),
        limit: Some(request.max_results.saturating_mul(10)),
        ..SearchQuery::default()
    }
}

/// Primary search plus, for wood, one search per species manufacturer
fn candidates(
    conn: &Connection,
    request: &MatchRequest,
    spine: &SpineResult,
    expansion: i64,
) -> Result<Vec<ArrowSummary>> {
    let mut results = ArrowRepo::search(conn, &primary_query(request, spine, expansion))?;
    tracing::debug!(candidates = results.len(), "primary search");

    if request.wants_wood() && results.len() < request.max_results {
        let mut seen: HashSet<i64> = results.iter().map(|r| r.id).collect();
        for manufacturer in wood_species_manufacturers(request.wood_species_preference.as_deref()) {
            let query = SearchQuery {
                manufacturer: Some(manufacturer.to_string()),
                material: Some("Wood".to_string()),
                spine_min: Some(spine.spine_range.minimum - expansion),
                spine_max: Some(spine.spine_range.maximum + expansion),
                limit: Some(request.max_results),
                ..SearchQuery::default()
            };
            for hit in ArrowRepo::search(conn, &query)? {
                if seen.insert(hit.id) {
                    results.push(hit);
                }
            }
        }
        tracing::debug!(candidates = results.len(), "wood species search");
    }

    Ok(results)
}

fn score(
    conn: &Connection,
    candidates: &[ArrowSummary],
    spine: &SpineResult,
    request: &MatchRequest,
    min_spine_options: usize,
) -> Result<Vec<ArrowMatch>> {
    let mut matches = Vec::new();
    for candidate in candidates {
        let Some(arrow) = ArrowRepo::get_details(conn, candidate.id)? else {
            continue;
        };
        if arrow.spine_specifications.len() < min_spine_options {
            continue;
        }
        if let Some(m) = evaluate_arrow(&arrow, spine, request) {
            matches.push(m);
        }
    }
    Ok(matches)
}
