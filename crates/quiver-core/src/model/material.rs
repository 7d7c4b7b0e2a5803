//! Material classification for shafts
//!
//! Scraped material strings are free text in several languages. Everything
//! stored in `arrows.material` is reduced to one of the [`Material`] names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "Carbon")]
    Carbon,
    #[serde(rename = "Carbon / Aluminum")]
    CarbonAluminum,
    #[serde(rename = "Aluminum")]
    Aluminum,
    #[serde(rename = "Wood")]
    Wood,
    #[serde(rename = "Fiberglass")]
    Fiberglass,
}

impl Material {
    pub const STANDARD: [Material; 5] = [
        Material::Carbon,
        Material::CarbonAluminum,
        Material::Aluminum,
        Material::Wood,
        Material::Fiberglass,
    ];

    /// Exact database spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Carbon => "Carbon",
            Material::CarbonAluminum => "Carbon / Aluminum",
            Material::Aluminum => "Aluminum",
            Material::Wood => "Wood",
            Material::Fiberglass => "Fiberglass",
        }
    }

    /// Exact match against the standard names
    pub fn from_standard(value: &str) -> Option<Material> {
        Self::STANDARD.into_iter().find(|m| m.as_str() == value)
    }

    pub fn is_standard(value: &str) -> bool {
        Self::from_standard(value).is_some()
    }

    /// Convert a user's material preference into the stored spelling
    ///
    /// Known keys map onto standard names; anything else is title-cased so
    /// it can still be compared against custom rows.
    pub fn preference_to_db(preference: &str) -> String {
        match preference.trim().to_lowercase().as_str() {
            "carbon" => Material::Carbon.as_str().to_string(),
            "aluminum" => Material::Aluminum.as_str().to_string(),
            "carbon-aluminum" => Material::CarbonAluminum.as_str().to_string(),
            "wood" => Material::Wood.as_str().to_string(),
            "fiberglass" => Material::Fiberglass.as_str().to_string(),
            other => title_case(other),
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

const NON_WOOD_MARKERS: [&str; 3] = ["carbon", "aluminum", "alloy"];

const WOOD_PATTERNS: [&str; 11] = [
    r"\bwood\b",
    r"\bcedar\b",
    r"\bpine\b",
    r"\boak\b",
    r"\bash\b",
    r"\bbirch\b",
    r"\bhickory\b",
    r"\bbamboo\b",
    r"\bdouglas fir\b",
    r"\bsitka spruce\b",
    r"\bport orford cedar\b",
];

/// Phrases that describe a wood look on a non-wood shaft
const COSMETIC_WOOD: [&str; 7] = [
    "bamboo look",
    "wood-grained",
    "wood grain",
    "cedar look",
    "wood appearance",
    "wooden look",
    "wood finish",
];

const CARBON_ALUMINUM_PHRASES: [&str; 15] = [
    "carbon core with 7075 alloy jacket",
    "carbon-core with 7075-alloy metal jacket",
    "carbon core with aluminum jacket",
    "carbon with aluminum jacket",
    "carbon fiber bonded to a 7075 alloy core",
    "carbon fiber bonded to a precision 7075 alloy core",
    "carbon and 7075 aluminum composited",
    "carbon and aluminum",
    "carbon fiber on a precision, thin-wall aluminum core",
    "carbon fiber on aluminum core",
    "carbon fiber on a aluminum core",
    "carbon on aluminum core",
    "carbon fiber with aluminum core",
    "fmj construction",
    "fmj",
];

const ALUMINUM_MARKERS: [&str; 6] = ["aluminum", "aluminium", "alloy", "enaw", "7075", "7001"];
const CARBON_MARKERS: [&str; 2] = ["carbon", "carb"];

static WOOD_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    WOOD_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Reduce a scraped material (plus optional description) to a standard name
///
/// Only Carbon, Carbon / Aluminum, Aluminum and Wood are produced. Empty
/// input defaults to Carbon.
pub fn normalize_material(material: Option<&str>, description: Option<&str>) -> Material {
    let mut combined = String::new();
    if let Some(m) = material {
        combined.push_str(m);
    }
    if let Some(d) = description {
        combined.push(' ');
        combined.push_str(d);
    }
    if combined.trim().is_empty() {
        return Material::Carbon;
    }
    let text = combined.to_lowercase();

    if !contains_any(&text, &NON_WOOD_MARKERS) {
        let has_wood = WOOD_REGEXES.iter().any(|re| re.is_match(&text));
        if has_wood && !contains_any(&text, &COSMETIC_WOOD) {
            return Material::Wood;
        }
    }

    if contains_any(&text, &CARBON_ALUMINUM_PHRASES) {
        return Material::CarbonAluminum;
    }

    if contains_any(&text, &ALUMINUM_MARKERS) && !contains_any(&text, &CARBON_MARKERS) {
        return Material::Aluminum;
    }

    Material::Carbon
}

/// Known variants, checked in order as substrings
const MATERIAL_MAPPING: [(&str, Material); 20] = [
    ("kohlefaser", Material::Carbon),
    ("kohlenstoff", Material::Carbon),
    ("carbonfaser", Material::Carbon),
    ("aluminium", Material::Aluminum),
    ("holz", Material::Wood),
    ("fiberglas", Material::Fiberglass),
    ("carbon fiber", Material::Carbon),
    ("carbon fibre", Material::Carbon),
    ("graphite", Material::Carbon),
    ("alloy", Material::Aluminum),
    ("wood shaft", Material::Wood),
    ("wooden", Material::Wood),
    ("timber", Material::Wood),
    ("glass", Material::Fiberglass),
    ("carbon-aluminum", Material::CarbonAluminum),
    ("carbon/aluminum", Material::CarbonAluminum),
    ("carbon + aluminum", Material::CarbonAluminum),
    ("carbon core aluminum jacket", Material::CarbonAluminum),
    ("carbon aluminum", Material::CarbonAluminum),
    ("carbon aluminium", Material::CarbonAluminum),
];

/// Suggest the standard name for a non-standard stored material
pub fn suggest_material_mapping(raw: &str) -> Material {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return Material::Carbon;
    }

    if let Some((_, m)) = MATERIAL_MAPPING.iter().find(|(v, _)| text.contains(v)) {
        return *m;
    }

    if contains_any(&text, &["carbon", "graphite", "fibre", "fiber"]) {
        if contains_any(&text, &["aluminum", "alloy", "metal"]) {
            return Material::CarbonAluminum;
        }
        return Material::Carbon;
    }
    if contains_any(&text, &["aluminum", "alloy"]) {
        return Material::Aluminum;
    }
    if contains_any(&text, &["wood", "cedar", "pine", "bamboo", "ash"]) {
        return Material::Wood;
    }
    if text.contains("glass") {
        return Material::Fiberglass;
    }
    Material::Carbon
}

/// True when the stored material names a wood shaft
pub fn is_wood_material(material: Option<&str>) -> bool {
    material
        .map(|m| m.to_lowercase().contains("wood"))
        .unwrap_or(false)
}
