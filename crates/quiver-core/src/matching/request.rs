//! What an archer asks the matcher for

use crate::model::bow::BowConfiguration;
use crate::model::material::Material;
use crate::spine::calculator::{SpineRequest, SpineUnits};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_MIN_SPINE_OPTIONS: usize = 3;

/// Wood shafts usually come in fewer spine groups
pub const WOOD_MIN_SPINE_OPTIONS: usize = 2;

/// Shorthand manufacturer names and their catalog spelling
const MANUFACTURER_ALIASES: &[(&str, &str)] = &[
    ("Easton", "Easton Archery"),
    ("Victory", "Victory Archery"),
    ("Traditional Wood", "Traditional Wood Arrows"),
    ("Nijora", "Nijora Archery"),
    ("Aurel", "Aurel Archery"),
    ("Pandarus", "Pandarus Archery"),
    ("Skylon", "Skylon Archery"),
];

/// Fragments that mark a preference as a wood shaft maker
const WOOD_MANUFACTURER_HINTS: &[&str] = &[
    "traditional wood",
    "traditional wood arrows",
    "port orford cedar",
    "sitka spruce",
    "douglas fir",
    "pine",
    "ash",
    "bamboo",
];

/// Every wood shaft maker in the catalog
pub const WOOD_MANUFACTURERS: &[&str] = &[
    "Traditional Wood Arrows",
    "Port Orford Cedar Shafts",
    "Sitka Spruce Shafts",
    "Douglas Fir Shafts",
    "Pine Shafts",
    "Ash Shafts",
    "Bamboo Shafts",
];

/// Map a shorthand manufacturer name onto the stored name
pub fn canonical_manufacturer(name: &str) -> &str {
    MANUFACTURER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// Manufacturers to search for a wood species preference
pub fn wood_species_manufacturers(species: Option<&str>) -> Vec<&'static str> {
    match species.unwrap_or("") {
        "Port Orford Cedar" => vec!["Port Orford Cedar Shafts"],
        "Sitka Spruce" => vec!["Sitka Spruce Shafts"],
        "Douglas Fir" => vec!["Douglas Fir Shafts"],
        "Pine" => vec!["Pine Shafts"],
        "Ash" => vec!["Ash Shafts"],
        "Bamboo" => vec!["Bamboo Shafts", "Traditional Wood Arrows"],
        _ => WOOD_MANUFACTURERS.to_vec(),
    }
}

/// Bow, arrow build and preferences for a match run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub bow: BowConfiguration,
    pub arrow_length: f64,
    pub point_weight: f64,
    pub nock_weight: f64,
    pub fletching_weight: f64,
    pub insert_weight: f64,
    pub preferred_manufacturers: Vec<String>,
    pub target_diameter_range: Option<(f64, f64)>,
    pub target_weight_range: Option<(f64, f64)>,
    pub target_foc_range: Option<(f64, f64)>,
    pub arrow_type_preference: Option<String>,
    pub material_preference: Option<String>,
    pub wood_species_preference: Option<String>,
    pub max_results: usize,
    pub min_spine_options: usize,
}

impl MatchRequest {
    pub fn new(bow: BowConfiguration, arrow_length: f64) -> Self {
        Self {
            bow,
            arrow_length,
            point_weight: 100.0,
            nock_weight: 10.0,
            fletching_weight: 15.0,
            insert_weight: 15.0,
            preferred_manufacturers: Vec::new(),
            target_diameter_range: None,
            target_weight_range: None,
            target_foc_range: None,
            arrow_type_preference: None,
            material_preference: None,
            wood_species_preference: None,
            max_results: DEFAULT_MAX_RESULTS,
            min_spine_options: DEFAULT_MIN_SPINE_OPTIONS,
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

    pub fn with_preferred_manufacturers(mut self, names: Vec<String>) -> Self {
        self.preferred_manufacturers = names;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn wants_wood(&self) -> bool {
        self.material_preference
            .as_deref()
            .map(|m| m.trim().eq_ignore_ascii_case("wood"))
            .unwrap_or(false)
    }

    /// Calculator input for this build
    pub fn spine_request(&self) -> SpineRequest {
        SpineRequest {
            arrow_length: self.arrow_length,
            point_weight: self.point_weight,
            nock_weight: self.nock_weight,
            fletching_weight: self.fletching_weight,
            material_preference: self.material_preference.clone(),
        }
    }

    /// How far past the calculated range the catalog search reaches
    pub fn spine_expansion(units: SpineUnits) -> i64 {
        match units {
            SpineUnits::Pounds => 5,
            SpineUnits::Carbon => 50,
        }
    }

    pub fn min_spine_requirement(&self) -> usize {
        if self.wants_wood() {
            WOOD_MIN_SPINE_OPTIONS
        } else {
            self.min_spine_options
        }
    }

    /// Arrow type filter; wood shafts are rarely typed so it is skipped
    pub fn arrow_type_filter(&self) -> Option<String> {
        if self.wants_wood() {
            None
        } else {
            self.arrow_type_preference.clone()
        }
    }

    pub fn material_filter(&self) -> Option<String> {
        self.material_preference
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .map(Material::preference_to_db)
    }

    /// Manufacturer filter for the primary search
    ///
    /// Only the first preference is used. For wood, a filter is produced
    /// only when a preference names a wood maker; otherwise species lookups
    /// take over.
    pub fn manufacturer_filter(&self) -> Option<String> {
        if self.wants_wood() {
            return self
                .preferred_manufacturers
                .iter()
                .find(|pref| {
                    let lower = pref.to_lowercase();
                    WOOD_MANUFACTURER_HINTS.iter().any(|hint| lower.contains(hint))
                })
                .map(|pref| canonical_manufacturer(pref).to_string());
        }
        self.preferred_manufacturers
            .first()
            .map(|pref| canonical_manufacturer(pref).to_string())
    }

    /// True when any preference is a case-insensitive substring of `manufacturer`
    pub fn prefers(&self, manufacturer: &str) -> bool {
        let lower = manufacturer.to_lowercase();
        self.preferred_manufacturers
            .iter()
            .any(|pref| lower.contains(&pref.to_lowercase()))
    }
}
