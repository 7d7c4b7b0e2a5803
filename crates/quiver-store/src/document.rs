//! Processed extraction file shape
//!
//! The scraper writes these documents under `processed/` and the importer
//! reads them back. Scraped fields are loosely typed, so spines and lengths
//! are kept as raw JSON and coerced on access.

use chrono::{DateTime, Utc};
use quiver_core::model::ArrowSpecification;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model names that mean "the extractor could not tell"
const PLACEHOLDER_MODEL_NAMES: [&str; 5] = ["unknown model", "unknown", "n/a", "none", ""];

/// Manufacturer used when a file names none
pub const DEFAULT_MANUFACTURER: &str = "Unknown";

fn default_manufacturer() -> String {
    DEFAULT_MANUFACTURER.to_string()
}

/// One processed manufacturer file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrowDocument {
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
    #[serde(default)]
    pub arrows: Vec<ImportedArrow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_arrows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_spine_options: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// One arrow entry as found in a processed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportedArrow {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub carbon_content: Option<String>,
    #[serde(default)]
    pub arrow_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_image_url: Option<String>,
    #[serde(default)]
    pub spine_specifications: Vec<ImportedSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_use: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraper_version: Option<String>,
}

/// One spine row as found in a processed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportedSpec {
    #[serde(default)]
    pub spine: Value,
    #[serde(default)]
    pub outer_diameter: Option<f64>,
    #[serde(default)]
    pub inner_diameter: Option<f64>,
    #[serde(default)]
    pub gpi_weight: Option<f64>,
    #[serde(default)]
    pub length_options: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_weight_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nock_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ImportedSpec {
    /// Spine as an integer. Strings use their leading digits, so "40-45" is 40.
    pub fn spine_value(&self) -> Option<i64> {
        match &self.spine {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let digits: String = s
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().ok()
            }
            _ => None,
        }
    }

    /// Length options as stored JSON text, or None when absent or empty
    pub fn length_options_json(&self) -> Option<String> {
        match &self.length_options {
            Value::Null => None,
            Value::Array(items) if items.is_empty() => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl ImportedArrow {
    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .or(self.primary_image_url.as_deref())
    }

    /// Recommended use flattened to "a, b"
    pub fn recommended_use_text(&self) -> Option<String> {
        match self.recommended_use.as_ref()? {
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Rejection reason, or None when the arrow may be imported
    pub fn rejection(&self) -> Option<&'static str> {
        let name = self.model_name().to_lowercase();
        if PLACEHOLDER_MODEL_NAMES.contains(&name.as_str()) {
            return Some("missing or placeholder model name");
        }
        let has_text = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if self.spine_specifications.is_empty()
            && !has_text(&self.description)
            && !has_text(&self.material)
        {
            return Some("no spine specifications, description or material");
        }
        None
    }
}

impl ImportedArrow {
    fn from_specification(spec: &ArrowSpecification) -> Self {
        let spine_specifications = spec
            .spine_specifications
            .iter()
            .map(|s| ImportedSpec {
                spine: Value::from(s.spine),
                outer_diameter: Some(s.outer_diameter),
                inner_diameter: s.inner_diameter,
                gpi_weight: Some(s.gpi_weight),
                length_options: Value::from(s.length_options.clone()),
                ..ImportedSpec::default()
            })
            .collect();

        Self {
            model_name: Some(spec.model_name.clone()),
            manufacturer: Some(spec.manufacturer.clone()),
            material: spec.material.clone(),
            description: spec.description.clone(),
            carbon_content: spec.carbon_content.clone(),
            arrow_type: spec.arrow_type.map(|t| t.as_str().to_string()),
            image_url: None,
            primary_image_url: spec.primary_image_url.clone(),
            spine_specifications,
            recommended_use: if spec.recommended_use.is_empty() {
                None
            } else {
                Some(Value::from(spec.recommended_use.clone()))
            },
            price_range: spec.price_range.clone(),
            availability: spec.availability.clone(),
            source_url: Some(spec.source_url.clone()),
            scraper_version: Some(spec.scraper_version.clone()),
        }
    }
}

impl ArrowDocument {
    /// Build the processed-file shape for freshly extracted arrows
    pub fn from_specifications(
        manufacturer: &str,
        arrows: &[ArrowSpecification],
        now: DateTime<Utc>,
    ) -> Self {
        let total_spine_options = arrows
            .iter()
            .map(|a| a.spine_specifications.len() as u64)
            .sum();
        Self {
            manufacturer: manufacturer.to_string(),
            arrows: arrows.iter().map(ImportedArrow::from_specification).collect(),
            total_arrows: Some(arrows.len() as u64),
            total_spine_options: Some(total_spine_options),
            last_updated: Some(now.to_rfc3339()),
        }
    }

    /// Files with no arrows, or that declare zero, are skipped
    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty() || self.total_arrows == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::model::SpineSpecification;
    use serde_json::json;

    #[test]
    fn test_spine_value_coercion() {
        let spec = |v: Value| ImportedSpec {
            spine: v,
            ..ImportedSpec::default()
        };
        assert_eq!(spec(json!(340)).spine_value(), Some(340));
        assert_eq!(spec(json!("400")).spine_value(), Some(400));
        assert_eq!(spec(json!("40-45")).spine_value(), Some(40));
        assert_eq!(spec(json!(" 55#")).spine_value(), Some(55));
        assert_eq!(spec(json!("stiff")).spine_value(), None);
        assert_eq!(spec(Value::Null).spine_value(), None);
    }

    #[test]
    fn test_length_options_json() {
        let spec = |v: Value| ImportedSpec {
            length_options: v,
            ..ImportedSpec::default()
        };
        assert_eq!(spec(json!([])).length_options_json(), None);
        assert_eq!(spec(Value::Null).length_options_json(), None);
        assert_eq!(
            spec(json!([29.0, 30.5])).length_options_json().as_deref(),
            Some("[29.0,30.5]")
        );
    }

    #[test]
    fn test_rejection_rules() {
        let arrow: ImportedArrow = serde_json::from_value(json!({
            "model_name": "N/A",
            "material": "carbon"
        }))
        .unwrap();
        assert!(arrow.rejection().is_some());

        let arrow: ImportedArrow = serde_json::from_value(json!({
            "model_name": "Hunter XT"
        }))
        .unwrap();
        assert!(arrow.rejection().is_some());

        let arrow: ImportedArrow = serde_json::from_value(json!({
            "model_name": "Hunter XT",
            "description": "A hunting shaft"
        }))
        .unwrap();
        assert!(arrow.rejection().is_none());
    }

    #[test]
    fn test_recommended_use_flattened() {
        let arrow: ImportedArrow = serde_json::from_value(json!({
            "model_name": "X",
            "recommended_use": ["hunting", "3d"]
        }))
        .unwrap();
        assert_eq!(arrow.recommended_use_text().as_deref(), Some("hunting, 3d"));
    }

    #[test]
    fn test_document_from_specifications() {
        // Given: one extracted arrow with two spines
        let specs = vec![
            SpineSpecification::new(300, 0.246, 9.5).unwrap(),
            SpineSpecification::new(400, 0.246, 8.4).unwrap(),
        ];
        let arrow = ArrowSpecification::new(
            "Gold Tip",
            "Hunter",
            specs,
            "https://example.com/hunter",
        )
        .unwrap();

        // When: the document is built
        let doc = ArrowDocument::from_specifications("Gold Tip", &[arrow], Utc::now());

        // Then: totals and spines carry over
        assert_eq!(doc.total_arrows, Some(1));
        assert_eq!(doc.total_spine_options, Some(2));
        assert_eq!(doc.arrows[0].spine_specifications[1].spine_value(), Some(400));
        assert!(!doc.is_empty());
    }
}
