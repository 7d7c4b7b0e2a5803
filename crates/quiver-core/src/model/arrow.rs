//! Arrow model specifications as produced by extraction

use crate::errors::{ModelError, Result};
use crate::model::spine::{DiameterCategory, SpineSpecification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SCRAPER_VERSION: &str = "1.0";

/// Primary use category of an arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrowType {
    #[serde(rename = "hunting")]
    Hunting,
    #[serde(rename = "target")]
    Target,
    #[serde(rename = "indoor")]
    Indoor,
    #[serde(rename = "outdoor")]
    Outdoor,
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "recreational")]
    Recreational,
}

/// Keyword to type, checked in order against the lowercased input
const ARROW_TYPE_KEYWORDS: [(&str, ArrowType); 10] = [
    ("target", ArrowType::Target),
    ("hunting", ArrowType::Hunting),
    ("indoor", ArrowType::Indoor),
    ("outdoor", ArrowType::Outdoor),
    ("3d", ArrowType::ThreeD),
    ("recreational", ArrowType::Recreational),
    ("competition", ArrowType::Target),
    ("field", ArrowType::Outdoor),
    ("bowhunting", ArrowType::Hunting),
    ("practice", ArrowType::Recreational),
];

impl ArrowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrowType::Hunting => "hunting",
            ArrowType::Target => "target",
            ArrowType::Indoor => "indoor",
            ArrowType::Outdoor => "outdoor",
            ArrowType::ThreeD => "3d",
            ArrowType::Recreational => "recreational",
        }
    }

    /// Map free text from a product page onto a type
    ///
    /// Empty input yields `None`; unrecognised text falls back to target.
    pub fn normalize(raw: &str) -> Option<ArrowType> {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        Some(
            ARROW_TYPE_KEYWORDS
                .iter()
                .find(|(keyword, _)| lowered.contains(keyword))
                .map(|(_, t)| *t)
                .unwrap_or(ArrowType::Target),
        )
    }
}

impl std::fmt::Display for ArrowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A manufacturer's arrow model with one specification per spine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowSpecification {
    pub manufacturer: String,
    pub model_name: String,
    pub spine_specifications: Vec<SpineSpecification>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub carbon_content: Option<String>,
    #[serde(default)]
    pub arrow_type: Option<ArrowType>,
    #[serde(default)]
    pub recommended_use: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_image_url: Option<String>,
    #[serde(default)]
    pub straightness_tolerance: Option<String>,
    #[serde(default)]
    pub weight_tolerance: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
    pub scraper_version: String,
}

impl ArrowSpecification {
    /// Create a validated specification; spine entries are sorted ascending
    pub fn new(
        manufacturer: impl Into<String>,
        model_name: impl Into<String>,
        spine_specifications: Vec<SpineSpecification>,
        source_url: impl Into<String>,
    ) -> Result<Self> {
        let spec = Self {
            manufacturer: manufacturer.into().trim().to_string(),
            model_name: model_name.into().trim().to_string(),
            spine_specifications,
            material: None,
            carbon_content: None,
            arrow_type: None,
            recommended_use: Vec::new(),
            description: None,
            primary_image_url: None,
            straightness_tolerance: None,
            weight_tolerance: None,
            price_range: None,
            availability: None,
            source_url: source_url.into(),
            scraped_at: Utc::now(),
            scraper_version: SCRAPER_VERSION.to_string(),
        };
        spec.validated()
    }

    /// Validate and sort; used after deserialising data from disk
    pub fn validated(mut self) -> Result<Self> {
        if self.manufacturer.trim().is_empty() {
            return Err(ModelError::EmptyManufacturer);
        }
        if self.model_name.trim().is_empty() {
            return Err(ModelError::EmptyModelName);
        }
        if self.spine_specifications.is_empty() {
            return Err(ModelError::NoSpineSpecifications {
                model_name: self.model_name.clone(),
            });
        }

        let mut specs = Vec::with_capacity(self.spine_specifications.len());
        for spec in self.spine_specifications {
            specs.push(spec.normalized()?);
        }
        specs.sort_by_key(|s| s.spine);
        if let Some(dup) = specs.windows(2).find(|w| w[0].spine == w[1].spine) {
            return Err(ModelError::DuplicateSpine {
                model_name: self.model_name.clone(),
                spine: dup[0].spine,
            });
        }
        self.spine_specifications = specs;
        Ok(self)
    }

    pub fn spine_options(&self) -> Vec<u32> {
        self.spine_specifications.iter().map(|s| s.spine).collect()
    }

    pub fn spec_for_spine(&self, spine: u32) -> Option<&SpineSpecification> {
        self.spine_specifications.iter().find(|s| s.spine == spine)
    }

    /// (min, max) outer diameter across spines
    pub fn diameter_range(&self) -> Option<(f64, f64)> {
        min_max(self.spine_specifications.iter().map(|s| s.outer_diameter))
    }

    /// (min, max) GPI across spines
    pub fn gpi_range(&self) -> Option<(f64, f64)> {
        min_max(self.spine_specifications.iter().map(|s| s.gpi_weight))
    }

    /// Distinct categories, smallest first
    pub fn diameter_categories(&self) -> Vec<DiameterCategory> {
        self.spine_specifications
            .iter()
            .filter_map(|s| s.diameter_category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn primary_diameter_category(&self) -> Option<DiameterCategory> {
        self.diameter_categories().into_iter().next()
    }

    /// Inner-preferred diameter of the given spine, or of the first spine
    pub fn effective_diameter(&self, spine: Option<u32>) -> Option<f64> {
        match spine {
            Some(s) => self.spec_for_spine(s).map(|spec| spec.effective_diameter()),
            None => self
                .spine_specifications
                .first()
                .map(|spec| spec.effective_diameter()),
        }
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
