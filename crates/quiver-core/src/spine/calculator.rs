//! Required spine for a bow setup
//!
//! Compound and recurve results are in carbon spine numbers (deflection x
//! 1000, lower is stiffer). Traditional bows shooting wood get pounds.

use crate::errors::{ModelError, Result};
use crate::model::bow::{BowConfiguration, BowType, RestType, DEFAULT_CENTER_SHOT};
use crate::spine::charts::{self, closest_index, WOOD_POINT_STEPS};
use serde::Serialize;

/// Reference point weight (grains) the charts are built on
pub const BASELINE_POINT_WEIGHT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpineUnits {
    Carbon,
    Pounds,
}

/// Arrow build the spine is calculated for
#[derive(Debug, Clone, PartialEq)]
pub struct SpineRequest {
    pub arrow_length: f64,
    pub point_weight: f64,
    pub nock_weight: f64,
    pub fletching_weight: f64,
    pub material_preference: Option<String>,
}

impl SpineRequest {
    pub fn new(arrow_length: f64) -> Self {
        Self {
            arrow_length,
            point_weight: BASELINE_POINT_WEIGHT,
            nock_weight: 10.0,
            fletching_weight: 15.0,
            material_preference: None,
        }
    }

    pub fn with_point_weight(mut self, point_weight: f64) -> Self {
        self.point_weight = point_weight;
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material_preference = Some(material.into());
        self
    }

    fn wants_wood(&self) -> bool {
        self.material_preference
            .as_deref()
            .map(|m| m.trim().eq_ignore_ascii_case("wood"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpineRange {
    pub minimum: i64,
    pub optimal: i64,
    pub maximum: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpineResult {
    pub bow_type: BowType,
    pub calculated_spine: i64,
    pub spine_range: SpineRange,
    pub adjustments: Vec<Adjustment>,
    pub total_adjustment: i64,
    pub base_spine: f64,
    pub confidence: Confidence,
    pub spine_units: SpineUnits,
    pub notes: Vec<String>,
}

impl SpineResult {
    pub fn is_pounds(&self) -> bool {
        self.spine_units == SpineUnits::Pounds
    }
}

fn round_i64(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Calculate the required spine for a bow and arrow build
///
/// # Errors
///
/// `InvalidCalculatorInput` when draw weight or arrow length is not positive.
pub fn calculate_required_spine(bow: &BowConfiguration, request: &SpineRequest) -> Result<SpineResult> {
    if bow.draw_weight.is_nan() || bow.draw_weight <= 0.0 {
        return Err(ModelError::InvalidCalculatorInput {
            reason: format!("draw weight must be positive, got {}", bow.draw_weight),
        });
    }
    if request.arrow_length.is_nan() || request.arrow_length <= 0.0 {
        return Err(ModelError::InvalidCalculatorInput {
            reason: format!("arrow length must be positive, got {}", request.arrow_length),
        });
    }

    let result = match bow.bow_type {
        BowType::Compound => compound(bow, request),
        BowType::Recurve => recurve(bow, request),
        BowType::Traditional if request.wants_wood() => traditional_wood(bow, request),
        BowType::Traditional => traditional_carbon(bow, request),
    };
    tracing::debug!(
        bow_type = bow.bow_type.as_str(),
        calculated_spine = result.calculated_spine,
        "spine calculated"
    );
    Ok(result)
}

struct Draft {
    base_spine: f64,
    adjustments: Vec<Adjustment>,
    calculated: f64,
    tolerance: f64,
}

impl Draft {
    fn total(&self) -> f64 {
        self.adjustments.iter().map(|a| a.value).sum()
    }

    fn finish(
        self,
        bow: &BowConfiguration,
        confidence: Confidence,
        units: SpineUnits,
        extra_notes: &[&str],
    ) -> SpineResult {
        let total = self.total();
        let mut notes = if units == SpineUnits::Carbon {
            spine_notes(bow, self.calculated)
        } else {
            Vec::new()
        };
        notes.extend(extra_notes.iter().map(|n| n.to_string()));

        SpineResult {
            bow_type: bow.bow_type,
            calculated_spine: round_i64(self.calculated),
            spine_range: SpineRange {
                minimum: round_i64(self.calculated - self.tolerance),
                optimal: round_i64(self.calculated),
                maximum: round_i64(self.calculated + self.tolerance),
            },
            adjustments: self.adjustments,
            total_adjustment: round_i64(total),
            base_spine: self.base_spine,
            confidence,
            spine_units: units,
            notes,
        }
    }
}

fn compound(bow: &BowConfiguration, request: &SpineRequest) -> SpineResult {
    let base_spine = charts::lookup(charts::COMPOUND, bow.draw_weight, request.arrow_length, false);
    let adjustments = vec![
        Adjustment {
            name: "point_weight",
            value: (request.point_weight - BASELINE_POINT_WEIGHT) / 25.0 * 15.0,
        },
        Adjustment {
            name: "cam_type",
            value: bow.cam_type.spine_adjustment(),
        },
        Adjustment {
            name: "arrow_rest",
            value: bow.arrow_rest.spine_adjustment(),
        },
        Adjustment {
            name: "center_shot",
            value: (bow.center_shot - DEFAULT_CENTER_SHOT) * 100.0,
        },
    ];
    let mut draft = Draft {
        base_spine,
        adjustments,
        calculated: 0.0,
        tolerance: 25.0,
    };
    draft.calculated = base_spine - draft.total();
    draft.finish(bow, Confidence::High, SpineUnits::Carbon, &[])
}

fn recurve(bow: &BowConfiguration, request: &SpineRequest) -> SpineResult {
    let base_spine = charts::lookup(charts::RECURVE, bow.draw_weight, request.arrow_length, true);
    let adjustments = vec![Adjustment {
        name: "point_weight",
        value: (request.point_weight - BASELINE_POINT_WEIGHT) / 25.0 * 20.0,
    }];
    let mut draft = Draft {
        base_spine,
        adjustments,
        calculated: 0.0,
        tolerance: 30.0,
    };
    draft.calculated = base_spine - draft.total();
    draft.finish(bow, Confidence::Medium, SpineUnits::Carbon, &[])
}

/// Chart step for the point weight relative to the 100 gr baseline
fn wood_point_step(point_weight: f64) -> f64 {
    let i = closest_index(WOOD_POINT_STEPS.iter().map(|(w, _)| *w), point_weight);
    WOOD_POINT_STEPS[i].1 - 3.0
}

fn traditional_wood(bow: &BowConfiguration, request: &SpineRequest) -> SpineResult {
    let base_spine = charts::lookup(charts::WOOD, bow.draw_weight, request.arrow_length, false);
    let adjustments = vec![Adjustment {
        name: "point_weight",
        value: wood_point_step(request.point_weight) * 2.5,
    }];
    let mut draft = Draft {
        base_spine,
        adjustments,
        calculated: 0.0,
        tolerance: 5.0,
    };
    // Heavier points need a stiffer (higher poundage) wood shaft
    draft.calculated = base_spine + draft.total();
    draft.finish(
        bow,
        Confidence::High,
        SpineUnits::Pounds,
        &[
            "Based on traditional wood arrow spine chart",
            "Spine values in pounds (wood arrow standard)",
            "Point weight adjustment applied per chart guidelines",
            "Consider testing with bare shaft tuning",
        ],
    )
}

/// Carbon spine equivalent of a wood spine in pounds
pub fn wood_to_carbon_equivalent(wood_pounds: f64) -> f64 {
    (950.0 - wood_pounds * 9.0).max(300.0)
}

fn traditional_carbon(bow: &BowConfiguration, request: &SpineRequest) -> SpineResult {
    let wood = charts::lookup(charts::WOOD, bow.draw_weight, request.arrow_length, false);
    let base_spine = wood_to_carbon_equivalent(wood);
    let adjustments = vec![Adjustment {
        name: "point_weight",
        value: wood_point_step(request.point_weight) * 5.0,
    }];
    let mut draft = Draft {
        base_spine,
        adjustments,
        calculated: 0.0,
        tolerance: 30.0,
    };
    draft.calculated = base_spine - draft.total();
    draft.finish(
        bow,
        Confidence::Medium,
        SpineUnits::Carbon,
        &[
            "Based on traditional wood arrow spine chart (carbon equivalent)",
            "Point weight adjustment applied per chart guidelines",
            "Consider testing with bare shaft tuning",
        ],
    )
}

fn spine_notes(bow: &BowConfiguration, calculated: f64) -> Vec<String> {
    let mut notes = Vec::new();
    if calculated < 250.0 {
        notes.push("Very stiff arrow required - consider high draw weight setup".to_string());
    } else if calculated > 600.0 {
        notes.push("Weak spine required - double-check calculations".to_string());
    }
    if bow.bow_type == BowType::Compound {
        notes.push("Fine-tune with paper tuning or bare shaft testing".to_string());
        if bow.arrow_rest == RestType::WhiskerBiscuit {
            notes.push("Whisker biscuit may require slightly stiffer arrow".to_string());
        }
    }
    notes
}

/// Acceptable spine window around a target for the bow type
pub fn spine_tolerance_range(target: f64, bow_type: BowType) -> (f64, f64) {
    let tolerance = match bow_type {
        BowType::Compound => 25.0,
        BowType::Recurve => 30.0,
        BowType::Traditional => 40.0,
    };
    (target - tolerance, target + tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::bow::CamType;

    #[test]
    fn test_compound_baseline() {
        let bow = BowConfiguration::new(60.0, 28.0, BowType::Compound);
        let result = calculate_required_spine(&bow, &SpineRequest::new(28.0)).unwrap();
        assert_eq!(result.calculated_spine, 340);
        assert_eq!(
            result.spine_range,
            SpineRange {
                minimum: 315,
                optimal: 340,
                maximum: 365
            }
        );
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.spine_units, SpineUnits::Carbon);
        assert_eq!(
            result.notes,
            vec!["Fine-tune with paper tuning or bare shaft testing".to_string()]
        );
    }

    #[test]
    fn test_compound_adjustments() {
        let bow = BowConfiguration::new(70.0, 29.0, BowType::Compound)
            .with_cam(CamType::Hard)
            .with_rest(RestType::WhiskerBiscuit);
        let request = SpineRequest::new(29.0).with_point_weight(125.0);
        let result = calculate_required_spine(&bow, &request).unwrap();
        // 300 - (15 + 10 + 20 + 0)
        assert_eq!(result.calculated_spine, 255);
        assert_eq!(result.total_adjustment, 45);
        assert!(result
            .notes
            .iter()
            .any(|n| n.contains("Whisker biscuit")));
    }

    #[test]
    fn test_recurve() {
        let bow = BowConfiguration::new(40.0, 28.0, BowType::Recurve);
        let result = calculate_required_spine(&bow, &SpineRequest::new(28.0)).unwrap();
        assert_eq!(result.calculated_spine, 600);
        assert_eq!(result.spine_range.minimum, 570);
        assert_eq!(result.spine_range.maximum, 630);
        assert_eq!(result.confidence, Confidence::Medium);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_traditional_wood_in_pounds() {
        let bow = BowConfiguration::new(45.0, 28.0, BowType::Traditional);
        let request = SpineRequest::new(29.0)
            .with_point_weight(125.0)
            .with_material("Wood");
        let result = calculate_required_spine(&bow, &request).unwrap();
        // 52.5 + 2.5
        assert_eq!(result.calculated_spine, 55);
        assert_eq!(result.spine_range.minimum, 50);
        assert_eq!(result.spine_range.maximum, 60);
        assert!(result.is_pounds());
        assert_eq!(result.notes.len(), 4);
    }

    #[test]
    fn test_traditional_carbon_equivalent() {
        let bow = BowConfiguration::new(45.0, 28.0, BowType::Traditional);
        let result = calculate_required_spine(&bow, &SpineRequest::new(28.0)).unwrap();
        // 950 - 47.5 * 9 = 522.5, ties to even
        assert_eq!(result.calculated_spine, 522);
        assert_eq!(result.base_spine, 522.5);
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(wood_to_carbon_equivalent(80.0), 300.0);
    }

    #[test]
    fn test_rejects_non_positive_input() {
        let bow = BowConfiguration::new(0.0, 28.0, BowType::Compound);
        assert!(calculate_required_spine(&bow, &SpineRequest::new(28.0)).is_err());
        let bow = BowConfiguration::new(50.0, 28.0, BowType::Compound);
        assert!(calculate_required_spine(&bow, &SpineRequest::new(-1.0)).is_err());
    }

    #[test]
    fn test_tolerance_ranges() {
        assert_eq!(spine_tolerance_range(400.0, BowType::Compound), (375.0, 425.0));
        assert_eq!(spine_tolerance_range(400.0, BowType::Recurve), (370.0, 430.0));
        assert_eq!(spine_tolerance_range(400.0, BowType::Traditional), (360.0, 440.0));
    }
}
