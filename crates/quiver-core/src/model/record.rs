//! Rows read back from the catalog tables

use crate::model::spine::DiameterCategory;
use serde::Serialize;

/// One `spine_specifications` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpineSpecRecord {
    pub id: i64,
    pub arrow_id: i64,
    pub spine: Option<i64>,
    pub outer_diameter: Option<f64>,
    pub inner_diameter: Option<f64>,
    pub gpi_weight: Option<f64>,
    pub diameter_category: Option<DiameterCategory>,
    pub length_options: Vec<f64>,
    pub wall_thickness: Option<f64>,
    pub insert_weight_range: Option<String>,
    pub nock_size: Option<String>,
    pub notes: Option<String>,
}

/// One `arrows` row with its spine rows ordered by spine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowRecord {
    pub id: i64,
    pub manufacturer: String,
    pub model_name: String,
    pub material: Option<String>,
    pub carbon_content: Option<String>,
    pub arrow_type: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub recommended_use: Option<String>,
    pub price_range: Option<String>,
    pub spine_specifications: Vec<SpineSpecRecord>,
}

impl ArrowRecord {
    pub fn spine_values(&self) -> Vec<i64> {
        self.spine_specifications
            .iter()
            .filter_map(|s| s.spine)
            .collect()
    }
}
