//! Bow setup parameters used by the spine calculator and matcher

use crate::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BowType {
    Compound,
    Recurve,
    Traditional,
}

impl BowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BowType::Compound => "compound",
            BowType::Recurve => "recurve",
            BowType::Traditional => "traditional",
        }
    }
}

impl FromStr for BowType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compound" => Ok(BowType::Compound),
            "recurve" | "olympic" | "barebow" => Ok(BowType::Recurve),
            "traditional" | "longbow" => Ok(BowType::Traditional),
            other => Err(unknown("bow type", other)),
        }
    }
}

impl std::fmt::Display for BowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound cam aggressiveness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CamType {
    Soft,
    #[default]
    Medium,
    Hard,
}

impl CamType {
    /// Spine adjustment subtracted from the chart value
    pub fn spine_adjustment(&self) -> f64 {
        match self {
            CamType::Soft => -10.0,
            CamType::Medium => 0.0,
            CamType::Hard => 10.0,
        }
    }
}

impl FromStr for CamType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "soft" => Ok(CamType::Soft),
            "medium" => Ok(CamType::Medium),
            "hard" => Ok(CamType::Hard),
            other => Err(unknown("cam type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestType {
    #[default]
    DropAway,
    Blade,
    WhiskerBiscuit,
    FullContainment,
}

impl RestType {
    pub fn spine_adjustment(&self) -> f64 {
        match self {
            RestType::DropAway => 0.0,
            RestType::Blade => 10.0,
            RestType::WhiskerBiscuit => 20.0,
            RestType::FullContainment => 15.0,
        }
    }
}

impl FromStr for RestType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "drop_away" | "dropaway" => Ok(RestType::DropAway),
            "blade" => Ok(RestType::Blade),
            "whisker_biscuit" => Ok(RestType::WhiskerBiscuit),
            "full_containment" => Ok(RestType::FullContainment),
            other => Err(unknown("arrow rest", other)),
        }
    }
}

fn unknown(field: &str, value: &str) -> ModelError {
    ModelError::UnknownVariant {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Nominal center shot in inches
pub const DEFAULT_CENTER_SHOT: f64 = 13.0 / 16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowConfiguration {
    /// Pounds
    pub draw_weight: f64,
    /// Inches; informational only, spine charts key on arrow length
    pub draw_length: f64,
    pub bow_type: BowType,
    #[serde(default)]
    pub cam_type: CamType,
    pub center_shot: f64,
    #[serde(default)]
    pub arrow_rest: RestType,
}

impl BowConfiguration {
    pub fn new(draw_weight: f64, draw_length: f64, bow_type: BowType) -> Self {
        Self {
            draw_weight,
            draw_length,
            bow_type,
            cam_type: CamType::default(),
            center_shot: DEFAULT_CENTER_SHOT,
            arrow_rest: RestType::default(),
        }
    }

    pub fn with_cam(mut self, cam_type: CamType) -> Self {
        self.cam_type = cam_type;
        self
    }

    pub fn with_rest(mut self, arrow_rest: RestType) -> Self {
        self.arrow_rest = arrow_rest;
        self
    }

    pub fn with_center_shot(mut self, center_shot: f64) -> Self {
        self.center_shot = center_shot;
        self
    }
}
