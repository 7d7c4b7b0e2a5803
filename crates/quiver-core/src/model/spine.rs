//! Per-spine shaft specifications and diameter classification

use crate::errors::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Standard diameter classes, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterCategory {
    UltraThin,
    Thin,
    SmallHunting,
    StandardTarget,
    StandardHunting,
    LargeHunting,
    HeavyHunting,
}

impl DiameterCategory {
    pub const ALL: [DiameterCategory; 7] = [
        DiameterCategory::UltraThin,
        DiameterCategory::Thin,
        DiameterCategory::SmallHunting,
        DiameterCategory::StandardTarget,
        DiameterCategory::StandardHunting,
        DiameterCategory::LargeHunting,
        DiameterCategory::HeavyHunting,
    ];

    /// Stored column value
    pub fn as_str(&self) -> &'static str {
        match self {
            DiameterCategory::UltraThin => "ultra_thin",
            DiameterCategory::Thin => "thin",
            DiameterCategory::SmallHunting => "small_hunting",
            DiameterCategory::StandardTarget => "standard_target",
            DiameterCategory::StandardHunting => "standard_hunting",
            DiameterCategory::LargeHunting => "large_hunting",
            DiameterCategory::HeavyHunting => "heavy_hunting",
        }
    }

    /// Human readable label with the nominal diameter
    pub fn label(&self) -> &'static str {
        match self {
            DiameterCategory::UltraThin => "Ultra-thin (.166\")",
            DiameterCategory::Thin => "Thin (.204\")",
            DiameterCategory::SmallHunting => "Small hunting (.244\")",
            DiameterCategory::StandardTarget => "Standard target (.246\")",
            DiameterCategory::StandardHunting => "Standard hunting (.300\")",
            DiameterCategory::LargeHunting => "Large hunting (.340\")",
            DiameterCategory::HeavyHunting => "Heavy hunting (.400\"+)",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for DiameterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a single diameter in inches. Bounds are inclusive upper limits.
pub fn classify(diameter: f64) -> DiameterCategory {
    if diameter <= 0.166 {
        DiameterCategory::UltraThin
    } else if diameter <= 0.210 {
        DiameterCategory::Thin
    } else if diameter <= 0.245 {
        DiameterCategory::SmallHunting
    } else if diameter <= 0.260 {
        DiameterCategory::StandardTarget
    } else if diameter <= 0.320 {
        DiameterCategory::StandardHunting
    } else if diameter <= 0.360 {
        DiameterCategory::LargeHunting
    } else {
        DiameterCategory::HeavyHunting
    }
}

/// Classify a shaft, preferring the inner diameter when it is known
pub fn classify_diameter(inner: Option<f64>, outer: Option<f64>) -> Option<DiameterCategory> {
    inner
        .filter(|d| *d > 0.0)
        .or(outer.filter(|d| *d > 0.0))
        .map(classify)
}

/// Specification of one spine option of an arrow model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineSpecification {
    pub spine: u32,
    pub outer_diameter: f64,
    pub gpi_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub length_options: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_category: Option<DiameterCategory>,
}

impl SpineSpecification {
    /// Build and validate a specification; the diameter category is derived
    pub fn new(spine: u32, outer_diameter: f64, gpi_weight: f64) -> Result<Self> {
        let spec = Self {
            spine,
            outer_diameter,
            gpi_weight,
            inner_diameter: None,
            length_options: Vec::new(),
            diameter_category: classify_diameter(None, Some(outer_diameter)),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_inner_diameter(mut self, inner: f64) -> Result<Self> {
        self.inner_diameter = Some(inner);
        self.validate()?;
        self.diameter_category = classify_diameter(self.inner_diameter, Some(self.outer_diameter));
        Ok(self)
    }

    pub fn with_length_options(mut self, lengths: Vec<f64>) -> Self {
        self.length_options = lengths;
        self
    }

    /// Check ranges and recompute the category from the current diameters
    pub fn normalized(mut self) -> Result<Self> {
        self.validate()?;
        self.diameter_category = classify_diameter(self.inner_diameter, Some(self.outer_diameter));
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.spine == 0 || self.spine > 2000 {
            return Err(ModelError::SpineOutOfRange { spine: self.spine });
        }
        if !(self.outer_diameter > 0.0 && self.outer_diameter <= 1.0) {
            return Err(ModelError::InvalidOuterDiameter {
                value: self.outer_diameter,
            });
        }
        if !(self.gpi_weight > 0.0 && self.gpi_weight <= 50.0) {
            return Err(ModelError::InvalidGpi {
                value: self.gpi_weight,
            });
        }
        if let Some(inner) = self.inner_diameter {
            if inner <= 0.0 || inner >= self.outer_diameter {
                return Err(ModelError::InvalidInnerDiameter {
                    inner,
                    outer: self.outer_diameter,
                });
            }
        }
        Ok(())
    }

    /// Inner diameter when known, otherwise outer
    pub fn effective_diameter(&self) -> f64 {
        self.inner_diameter.unwrap_or(self.outer_diameter)
    }
}
