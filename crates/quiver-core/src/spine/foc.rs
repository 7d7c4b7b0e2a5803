//! Front-of-center balance

use crate::errors::{ModelError, Result};
use serde::Serialize;

/// Component weights in grains, length in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocInput {
    pub arrow_length: f64,
    pub point_weight: f64,
    pub shaft_weight: f64,
    pub nock_weight: f64,
    pub fletching_weight: f64,
    pub insert_weight: f64,
}

impl FocInput {
    pub fn new(arrow_length: f64, point_weight: f64, shaft_weight: f64) -> Self {
        Self {
            arrow_length,
            point_weight,
            shaft_weight,
            nock_weight: 10.0,
            fletching_weight: 15.0,
            insert_weight: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocResult {
    pub foc_percentage: f64,
    pub balance_point: f64,
    pub physical_center: f64,
    pub total_weight: f64,
    pub front_weight: f64,
    pub back_weight: f64,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// FOC assuming the shaft weight is spread evenly along its length
///
/// # Errors
///
/// `InvalidCalculatorInput` for a non-positive length or total weight.
pub fn calculate_foc(input: &FocInput) -> Result<FocResult> {
    if input.arrow_length.is_nan() || input.arrow_length <= 0.0 {
        return Err(ModelError::InvalidCalculatorInput {
            reason: format!("arrow length must be positive, got {}", input.arrow_length),
        });
    }
    let total = input.point_weight
        + input.shaft_weight
        + input.nock_weight
        + input.fletching_weight
        + input.insert_weight;
    if total.is_nan() || total <= 0.0 {
        return Err(ModelError::InvalidCalculatorInput {
            reason: "total arrow weight must be positive".to_string(),
        });
    }

    let front = input.point_weight + input.insert_weight + input.shaft_weight / 2.0;
    let back = input.nock_weight + input.fletching_weight + input.shaft_weight / 2.0;
    let center = input.arrow_length / 2.0;
    let balance = center + ((front - back) / total) * center;
    let foc = (balance - center) / input.arrow_length * 100.0;

    Ok(FocResult {
        foc_percentage: round_to(foc, 2),
        balance_point: round_to(balance, 3),
        physical_center: round_to(center, 3),
        total_weight: round_to(total, 1),
        front_weight: round_to(front, 1),
        back_weight: round_to(back, 1),
    })
}
