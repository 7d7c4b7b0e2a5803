//! Scoring one catalog arrow against a calculated spine

use crate::matching::request::MatchRequest;
use crate::model::bow::BowType;
use crate::model::record::{ArrowRecord, SpineSpecRecord};
use crate::spine::calculator::{Confidence, SpineRange, SpineResult};
use crate::spine::foc::{calculate_foc, FocInput};
use serde::Serialize;

pub const WEIGHT_SPINE_ACCURACY: f64 = 0.4;
pub const WEIGHT_AVAILABILITY: f64 = 0.2;
pub const WEIGHT_MANUFACTURER: f64 = 0.1;
pub const WEIGHT_DIAMETER: f64 = 0.15;
pub const WEIGHT_FOC: f64 = 0.15;

/// Spine count that earns full availability marks
const FULL_AVAILABILITY_SPINES: f64 = 8.0;

/// Score at or above which a manufacturer gets a guaranteed slot
pub const DIVERSITY_SCORE_FLOOR: f64 = 85.0;
pub const DIVERSITY_PER_MANUFACTURER: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowMatch {
    pub arrow_id: i64,
    pub manufacturer: String,
    pub model_name: String,
    pub matched_spine: i64,
    pub spine_deviation: f64,
    pub gpi_weight: Option<f64>,
    pub outer_diameter: Option<f64>,
    pub inner_diameter: Option<f64>,
    pub match_score: f64,
    pub spine_count: usize,
    pub confidence: Confidence,
    pub match_reasons: Vec<String>,
    pub potential_issues: Vec<String>,
    pub material: Option<String>,
    pub arrow_type: Option<String>,
    pub description: Option<String>,
    pub price_range: Option<String>,
}

fn half_width(range: &SpineRange) -> f64 {
    (range.maximum - range.minimum) as f64 / 2.0
}

fn midpoint(range: &SpineRange) -> f64 {
    (range.minimum + range.maximum) as f64 / 2.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Penalty score for a value outside `[min, max]`; `step` away costs everything
fn range_score(value: f64, (min, max): (f64, f64), step: f64) -> f64 {
    if value >= min && value <= max {
        return 100.0;
    }
    let deviation = if value < min { min - value } else { value - max };
    (100.0 - deviation / step * 100.0).max(0.0)
}

/// Pick the spec closest to `optimal`
///
/// Wood arrows with at least two specs whose spine range contains the
/// optimal spine count as an exact match.
fn best_spine(arrow: &ArrowRecord, optimal: f64, wood: bool) -> Option<(&SpineSpecRecord, f64)> {
    let specs: Vec<(&SpineSpecRecord, f64)> = arrow
        .spine_specifications
        .iter()
        .filter_map(|spec| spec.spine.map(|s| (spec, s as f64)))
        .collect();

    let closest = specs
        .iter()
        .map(|(spec, spine)| (*spec, (spine - optimal).abs()))
        .fold(None::<(&SpineSpecRecord, f64)>, |best, (spec, dev)| match best {
            Some((_, best_dev)) if best_dev <= dev => best,
            _ => Some((spec, dev)),
        })?;

    if wood && arrow.spine_specifications.len() >= 2 {
        let min = specs.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
        let max = specs.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
        if min <= optimal && optimal <= max {
            return Some((closest.0, 0.0));
        }
    }
    Some(closest)
}

fn confidence_for(deviation: f64, range: &SpineRange) -> Confidence {
    let ratio = deviation / half_width(range);
    if ratio <= 0.3 {
        Confidence::High
    } else if ratio <= 0.7 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn match_score(
    arrow: &ArrowRecord,
    spec: &SpineSpecRecord,
    matched_spine: f64,
    spine: &SpineResult,
    request: &MatchRequest,
) -> f64 {
    let optimal = spine.calculated_spine as f64;
    let deviation = (matched_spine - optimal).abs();
    let spine_accuracy = (100.0 - deviation / half_width(&spine.spine_range) * 100.0).max(0.0);

    let spine_count = arrow.spine_specifications.len() as f64;
    let availability = (spine_count / FULL_AVAILABILITY_SPINES * 100.0).min(100.0);

    let manufacturer = if request.preferred_manufacturers.is_empty()
        || request.prefers(&arrow.manufacturer)
    {
        100.0
    } else {
        50.0
    };

    let diameter = match (request.target_diameter_range, spec.outer_diameter) {
        (Some(target), Some(od)) if od != 0.0 => range_score(od, target, 0.05),
        _ => 100.0,
    };

    let foc = match (request.target_foc_range, spec.gpi_weight) {
        (Some(target), Some(gpi)) => {
            let input = FocInput {
                arrow_length: request.arrow_length,
                point_weight: request.point_weight,
                shaft_weight: gpi * request.arrow_length,
                nock_weight: request.nock_weight,
                fletching_weight: request.fletching_weight,
                insert_weight: request.insert_weight,
            };
            calculate_foc(&input)
                .map(|r| range_score(r.foc_percentage, target, 2.0))
                .unwrap_or(0.0)
        }
        _ => 100.0,
    };

    round1(
        spine_accuracy * WEIGHT_SPINE_ACCURACY
            + availability * WEIGHT_AVAILABILITY
            + manufacturer * WEIGHT_MANUFACTURER
            + diameter * WEIGHT_DIAMETER
            + foc * WEIGHT_FOC,
    )
}

fn match_reasons(
    arrow: &ArrowRecord,
    spec: &SpineSpecRecord,
    matched_spine: f64,
    optimal: f64,
    request: &MatchRequest,
) -> Vec<String> {
    let mut reasons = Vec::new();

    let deviation = (matched_spine - optimal).abs();
    reasons.push(
        if deviation <= 10.0 {
            "Excellent spine match"
        } else if deviation <= 25.0 {
            "Good spine match"
        } else {
            "Acceptable spine match"
        }
        .to_string(),
    );

    let count = arrow.spine_specifications.len();
    if count >= 6 {
        reasons.push(format!("Excellent availability ({count} spine options)"));
    } else if count >= 3 {
        reasons.push(format!("Good availability ({count} spine options)"));
    }

    if request.prefers(&arrow.manufacturer) {
        reasons.push(format!("Preferred manufacturer ({})", arrow.manufacturer));
    }

    if let Some(od) = spec.outer_diameter.filter(|d| *d != 0.0) {
        if od <= 0.24 {
            reasons.push("Small diameter for excellent penetration".to_string());
        } else if od >= 0.30 {
            reasons.push("Large diameter for maximum cutting surface".to_string());
        }
    }
    reasons
}

fn potential_issues(
    arrow: &ArrowRecord,
    spec: &SpineSpecRecord,
    matched_spine: f64,
    range: &SpineRange,
    request: &MatchRequest,
) -> Vec<String> {
    let mut issues = Vec::new();

    let deviation = (matched_spine - midpoint(range)).abs();
    if deviation > 40.0 {
        issues.push("Large spine deviation - may require tuning".to_string());
    } else if deviation > 25.0 {
        issues.push("Moderate spine deviation - paper tuning recommended".to_string());
    }

    if let Some(gpi) = spec.gpi_weight.filter(|g| *g != 0.0) {
        if gpi > 12.0 && request.bow.bow_type == BowType::Compound {
            issues.push("Heavy arrow - may reduce arrow speed significantly".to_string());
        } else if gpi < 5.0 {
            issues.push("Very light arrow - may cause noise and vibration".to_string());
        }
    }

    if let Some(od) = spec.outer_diameter.filter(|d| *d != 0.0) {
        if od < 0.20 {
            issues.push("Very small diameter - may be fragile".to_string());
        } else if od > 0.35 {
            issues.push("Large diameter - may cause wind drift".to_string());
        }
    }

    if arrow.spine_specifications.len() < 3 {
        issues.push("Limited spine options available".to_string());
    }
    issues
}

/// Score `arrow` for the calculated spine
///
/// Returns `None` when the arrow has no spine values to compare.
pub fn evaluate_arrow(
    arrow: &ArrowRecord,
    spine: &SpineResult,
    request: &MatchRequest,
) -> Option<ArrowMatch> {
    let optimal = spine.calculated_spine as f64;
    let wood = request.wants_wood()
        || arrow
            .material
            .as_deref()
            .map(|m| m.eq_ignore_ascii_case("wood"))
            .unwrap_or(false);

    let (spec, deviation) = best_spine(arrow, optimal, wood)?;
    let matched_spine = spec.spine?;
    let matched = matched_spine as f64;

    Some(ArrowMatch {
        arrow_id: arrow.id,
        manufacturer: arrow.manufacturer.clone(),
        model_name: arrow.model_name.clone(),
        matched_spine,
        spine_deviation: deviation,
        gpi_weight: spec.gpi_weight,
        outer_diameter: spec.outer_diameter,
        inner_diameter: spec.inner_diameter,
        match_score: match_score(arrow, spec, matched, spine, request),
        spine_count: arrow.spine_specifications.len(),
        confidence: confidence_for(deviation, &spine.spine_range),
        match_reasons: match_reasons(arrow, spec, matched, optimal, request),
        potential_issues: potential_issues(arrow, spec, matched, &spine.spine_range, request),
        material: arrow.material.clone(),
        arrow_type: arrow.arrow_type.clone(),
        description: arrow.description.clone(),
        price_range: arrow.price_range.clone(),
    })
}

/// Order by score and keep the list from being one manufacturer deep
///
/// Up to three strong matches per manufacturer go first, then the rest fill
/// the remaining slots in score order.
pub fn diversify(mut matches: Vec<ArrowMatch>, max_results: usize) -> Vec<ArrowMatch> {
    matches.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

    let mut per_manufacturer: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();
    let mut selected = Vec::new();
    let mut remaining = Vec::new();

    for m in matches {
        let count = per_manufacturer.entry(m.manufacturer.clone()).or_insert(0);
        if *count < DIVERSITY_PER_MANUFACTURER && m.match_score >= DIVERSITY_SCORE_FLOOR {
            *count += 1;
            selected.push(m);
        } else {
            remaining.push(m);
        }
    }

    let room = max_results.saturating_sub(selected.len());
    selected.extend(remaining.into_iter().take(room));
    selected.truncate(max_results);
    selected
}
