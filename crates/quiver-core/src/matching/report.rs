//! Plain-text recommendation report

use crate::matching::request::MatchRequest;
use crate::matching::scoring::ArrowMatch;
use crate::spine::foc::{calculate_foc, FocInput};
use std::fmt::Write;

pub const NO_MATCHES: &str = "No suitable arrows found for your bow configuration.";

const REPORT_LIMIT: usize = 5;

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render the top matches for `request`
pub fn recommendation_report(matches: &[ArrowMatch], request: &MatchRequest) -> String {
    if matches.is_empty() {
        return NO_MATCHES.to_string();
    }

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, matches, request);
    out
}

fn write_report(
    out: &mut String,
    matches: &[ArrowMatch],
    request: &MatchRequest,
) -> std::fmt::Result {
    writeln!(out, "ARROW RECOMMENDATION REPORT")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out)?;
    writeln!(out, "BOW CONFIGURATION:")?;
    writeln!(out, "- Type: {}", title_case(request.bow.bow_type.as_str()))?;
    writeln!(out, "- Draw Weight: {}#", request.bow.draw_weight)?;
    writeln!(out, "- Draw Length: {}\"", request.bow.draw_length)?;
    writeln!(out, "- Arrow Length: {}\"", request.arrow_length)?;
    writeln!(out, "- Point Weight: {} grains", request.point_weight)?;
    writeln!(out)?;
    writeln!(out, "TOP RECOMMENDATIONS:")?;

    for (i, m) in matches.iter().take(REPORT_LIMIT).enumerate() {
        let gpi = m.gpi_weight.unwrap_or(0.0);
        let shaft_weight = gpi * request.arrow_length;
        let total_weight =
            shaft_weight + request.point_weight + request.nock_weight + request.fletching_weight;
        let foc = calculate_foc(&FocInput {
            arrow_length: request.arrow_length,
            point_weight: request.point_weight,
            shaft_weight,
            nock_weight: request.nock_weight,
            fletching_weight: request.fletching_weight,
            insert_weight: request.insert_weight,
        })
        .map(|r| r.foc_percentage)
        .unwrap_or(0.0);

        writeln!(out)?;
        writeln!(out, "{}. {} {}", i + 1, m.manufacturer, m.model_name)?;
        writeln!(
            out,
            "   Match Score: {}/100 ({} confidence)",
            m.match_score, m.confidence
        )?;
        writeln!(
            out,
            "   - Spine: {} (deviation: +-{:.0})",
            m.matched_spine, m.spine_deviation
        )?;
        writeln!(out, "   - Weight: {gpi} GPI (~{total_weight:.0} total grains)")?;
        writeln!(
            out,
            "   - Diameter: {:.3}\"",
            m.outer_diameter.unwrap_or(0.0)
        )?;
        writeln!(out, "   - FOC: {foc:.1}%")?;
        writeln!(out, "   - Available spines: {} options", m.spine_count)?;
        writeln!(out, "   Match Reasons:")?;
        for reason in &m.match_reasons {
            writeln!(out, "      - {reason}")?;
        }
        if !m.potential_issues.is_empty() {
            writeln!(out, "   Considerations:")?;
            for issue in &m.potential_issues {
                writeln!(out, "      - {issue}")?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "TUNING NOTES:")?;
    writeln!(out, "- Fine-tune with paper tuning or walk-back tuning")?;
    writeln!(out, "- Consider broadhead testing for hunting setups")?;
    writeln!(
        out,
        "- Spine calculations are starting points - field testing is recommended"
    )?;
    Ok(())
}
