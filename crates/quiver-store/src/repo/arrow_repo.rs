//! Arrow catalog repository
//!
//! Inserts, updates and queries `arrows` and `spine_specifications`.

#![allow(clippy::result_large_err)]

use crate::document::{ImportedArrow, ImportedSpec};
use crate::errors::{from_rusqlite, Result};
use quiver_core::model::material::is_wood_material;
use quiver_core::model::{
    classify_diameter, normalize_material, ArrowRecord, DiameterCategory, SpineSpecRecord,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// What `upsert_arrow` did with an incoming arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
    Unchanged(i64),
}

impl UpsertOutcome {
    pub fn arrow_id(&self) -> i64 {
        match self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) | UpsertOutcome::Unchanged(id) => {
                *id
            }
        }
    }
}

/// Search filters; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchQuery {
    pub manufacturer: Option<String>,
    pub arrow_type: Option<String>,
    pub material: Option<String>,
    pub model: Option<String>,
    pub spine_min: Option<i64>,
    pub spine_max: Option<i64>,
    pub gpi_min: Option<f64>,
    pub gpi_max: Option<f64>,
    pub diameter_min: Option<f64>,
    pub diameter_max: Option<f64>,
    pub diameter_category: Option<DiameterCategory>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    fn has_spec_filter(&self) -> bool {
        self.spine_min.is_some()
            || self.spine_max.is_some()
            || self.gpi_min.is_some()
            || self.gpi_max.is_some()
            || self.diameter_min.is_some()
            || self.diameter_max.is_some()
            || self.diameter_category.is_some()
    }
}

/// One search hit with spine aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowSummary {
    pub id: i64,
    pub manufacturer: String,
    pub model_name: String,
    pub material: Option<String>,
    pub arrow_type: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub spine_count: i64,
    pub min_spine: Option<i64>,
    pub max_spine: Option<i64>,
    pub min_gpi: Option<f64>,
    pub max_gpi: Option<f64>,
    pub min_diameter: Option<f64>,
    pub max_diameter: Option<f64>,
    pub spine_display: String,
}

/// Spine range as shown to archers: "40-45#" for wood, "300-400" otherwise
pub fn spine_display(material: Option<&str>, min: Option<i64>, max: Option<i64>) -> String {
    let (min, max) = match (min, max) {
        (Some(lo), Some(hi)) if lo != 0 && hi != 0 => (lo, hi),
        _ => return "N/A".to_string(),
    };
    let suffix = if is_wood_material(material) { "#" } else { "" };
    if min == max {
        format!("{min}{suffix}")
    } else {
        format!("{min}-{max}{suffix}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManufacturerCount {
    pub manufacturer: String,
    pub arrow_count: i64,
    pub spec_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub diameter_category: String,
    pub count: i64,
}

/// Catalog-wide counts and ranges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseStatistics {
    pub total_arrows: i64,
    pub total_specifications: i64,
    pub total_manufacturers: usize,
    pub manufacturers: Vec<ManufacturerCount>,
    pub spine_range: (Option<i64>, Option<i64>),
    pub gpi_range: (Option<f64>, Option<f64>),
    pub diameter_range: (Option<f64>, Option<f64>),
    pub diameter_categories: Vec<CategoryCount>,
}

/// Repository for the arrow catalog
pub struct ArrowRepo;

impl ArrowRepo {
    /// Insert a new arrow or refresh an existing (manufacturer, model) row
    ///
    /// An existing row is rewritten only when the normalised material
    /// differs or the incoming description is longer than the stored one.
    /// A rewrite replaces `carbon_content`, `arrow_type` and `image_url` with
    /// the incoming values, including `None`; only the description is kept
    /// when the new one is empty.
    pub fn upsert_arrow(
        conn: &Connection,
        manufacturer: &str,
        arrow: &ImportedArrow,
    ) -> Result<UpsertOutcome> {
        let model_name = arrow.model_name();
        let material = normalize_material(arrow.material.as_deref(), arrow.description.as_deref());

        let existing = conn
            .query_row(
                "SELECT id, material, description FROM arrows
                 WHERE manufacturer = ?1 AND model_name = ?2",
                rusqlite::params![manufacturer, model_name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(from_rusqlite)?;

        let Some((id, old_material, old_description)) = existing else {
            conn.execute(
                "INSERT INTO arrows
                 (manufacturer, model_name, material, carbon_content, arrow_type, description,
                  image_url, recommended_use, price_range, availability, scraper_version,
                  source_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    manufacturer,
                    model_name,
                    material.as_str(),
                    arrow.carbon_content,
                    arrow.arrow_type,
                    arrow.description,
                    arrow.image(),
                    arrow.recommended_use_text(),
                    arrow.price_range,
                    arrow.availability,
                    arrow.scraper_version,
                    arrow.source_url,
                ],
            )
            .map_err(from_rusqlite)?;
            let id = conn.last_insert_rowid();
            tracing::debug!(arrow_id = id, manufacturer, model_name, "arrow inserted");
            return Ok(UpsertOutcome::Inserted(id));
        };

        let new_description = arrow.description.as_deref().filter(|d| !d.is_empty());
        let material_changed = old_material.as_deref() != Some(material.as_str());
        let description_longer = new_description
            .map(|d| d.chars().count() > old_description.as_deref().unwrap_or("").chars().count())
            .unwrap_or(false);

        if !material_changed && !description_longer {
            return Ok(UpsertOutcome::Unchanged(id));
        }

        conn.execute(
            "UPDATE arrows SET material = ?1, carbon_content = ?2, arrow_type = ?3,
                description = ?4, image_url = ?5
             WHERE id = ?6",
            rusqlite::params![
                material.as_str(),
                arrow.carbon_content,
                arrow.arrow_type,
                new_description.map(str::to_string).or(old_description),
                arrow.image(),
                id,
            ],
        )
        .map_err(from_rusqlite)?;
        tracing::debug!(
            arrow_id = id,
            material_changed,
            description_longer,
            "arrow updated"
        );
        Ok(UpsertOutcome::Updated(id))
    }

    /// Add one spine row; returns false when it was ignored
    ///
    /// Rows that duplicate an existing (arrow, spine) pair or lack a GPI
    /// weight are ignored.
    pub fn add_spine_specification(
        conn: &Connection,
        arrow_id: i64,
        spec: &ImportedSpec,
    ) -> Result<bool> {
        let category = classify_diameter(spec.inner_diameter, spec.outer_diameter);
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO spine_specifications
                 (arrow_id, spine, outer_diameter, gpi_weight, inner_diameter, diameter_category,
                  length_options, wall_thickness, insert_weight_range, nock_size, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    arrow_id,
                    spec.spine_value(),
                    spec.outer_diameter,
                    spec.gpi_weight,
                    spec.inner_diameter,
                    category.map(|c| c.as_str()),
                    spec.length_options_json(),
                    spec.wall_thickness,
                    spec.insert_weight_range,
                    spec.nock_size,
                    spec.notes,
                ],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    pub fn search(conn: &Connection, query: &SearchQuery) -> Result<Vec<ArrowSummary>> {
        let mut sql = String::from(
            "SELECT a.id, a.manufacturer, a.model_name, a.material, a.arrow_type,
                    a.description, a.image_url,
                    COUNT(s.id), MIN(s.spine), MAX(s.spine),
                    MIN(s.gpi_weight), MAX(s.gpi_weight),
                    MIN(s.outer_diameter), MAX(s.outer_diameter)
             FROM arrows a
             LEFT JOIN spine_specifications s ON a.id = s.arrow_id
             WHERE 1=1",
        );
        let mut params: Vec<SqlValue> = Vec::new();

        if let Some(m) = &query.manufacturer {
            sql.push_str(" AND a.manufacturer LIKE ?");
            params.push(SqlValue::Text(format!("%{m}%")));
        }
        if let Some(t) = &query.arrow_type {
            sql.push_str(" AND a.arrow_type = ?");
            params.push(SqlValue::Text(t.clone()));
        }
        if let Some(m) = &query.material {
            // Broad families also match composite spellings
            if matches!(m.as_str(), "Wood" | "Carbon" | "Aluminum") {
                sql.push_str(" AND a.material LIKE ?");
                params.push(SqlValue::Text(format!("%{m}%")));
            } else {
                sql.push_str(" AND a.material = ?");
                params.push(SqlValue::Text(m.clone()));
            }
        }
        if let Some(model) = &query.model {
            sql.push_str(" AND a.model_name LIKE ?");
            params.push(SqlValue::Text(format!("%{model}%")));
        }

        if query.has_spec_filter() {
            sql.push_str(" AND a.id IN (SELECT DISTINCT arrow_id FROM spine_specifications WHERE 1=1");
            if let Some(v) = query.spine_min {
                sql.push_str(" AND spine >= ?");
                params.push(SqlValue::Integer(v));
            }
            if let Some(v) = query.spine_max {
                sql.push_str(" AND spine <= ?");
                params.push(SqlValue::Integer(v));
            }
            if let Some(v) = query.gpi_min {
                sql.push_str(" AND gpi_weight >= ?");
                params.push(SqlValue::Real(v));
            }
            if let Some(v) = query.gpi_max {
                sql.push_str(" AND gpi_weight <= ?");
                params.push(SqlValue::Real(v));
            }
            if let Some(v) = query.diameter_min {
                sql.push_str(" AND outer_diameter >= ?");
                params.push(SqlValue::Real(v));
            }
            if let Some(v) = query.diameter_max {
                sql.push_str(" AND outer_diameter <= ?");
                params.push(SqlValue::Real(v));
            }
            if let Some(c) = query.diameter_category {
                sql.push_str(" AND diameter_category = ?");
                params.push(SqlValue::Text(c.as_str().to_string()));
            }
            sql.push(')');
        }

        sql.push_str(" GROUP BY a.id ORDER BY a.manufacturer, a.model_name LIMIT ?");
        let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
                let material: Option<String> = row.get(3)?;
                let min_spine: Option<i64> = row.get(8)?;
                let max_spine: Option<i64> = row.get(9)?;
                Ok(ArrowSummary {
                    id: row.get(0)?,
                    manufacturer: row.get(1)?,
                    model_name: row.get(2)?,
                    spine_display: spine_display(material.as_deref(), min_spine, max_spine),
                    material,
                    arrow_type: row.get(4)?,
                    description: row.get(5)?,
                    image_url: row.get(6)?,
                    spine_count: row.get(7)?,
                    min_spine,
                    max_spine,
                    min_gpi: row.get(10)?,
                    max_gpi: row.get(11)?,
                    min_diameter: row.get(12)?,
                    max_diameter: row.get(13)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        tracing::debug!(hits = rows.len(), "arrow search");
        Ok(rows)
    }

    /// Full arrow with its spine rows ordered by spine
    pub fn get_details(conn: &Connection, arrow_id: i64) -> Result<Option<ArrowRecord>> {
        let arrow = conn
            .query_row(
                "SELECT id, manufacturer, model_name, material, carbon_content, arrow_type,
                        description, image_url, source_url, recommended_use, price_range
                 FROM arrows WHERE id = ?1",
                [arrow_id],
                arrow_from_row,
            )
            .optional()
            .map_err(from_rusqlite)?;

        let Some(mut arrow) = arrow else {
            return Ok(None);
        };
        arrow.spine_specifications = Self::spine_specifications(conn, arrow_id)?;
        Ok(Some(arrow))
    }

    pub fn spine_specifications(conn: &Connection, arrow_id: i64) -> Result<Vec<SpineSpecRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, arrow_id, spine, outer_diameter, inner_diameter, gpi_weight,
                        diameter_category, length_options, wall_thickness,
                        insert_weight_range, nock_size, notes
                 FROM spine_specifications WHERE arrow_id = ?1 ORDER BY spine",
            )
            .map_err(from_rusqlite)?;
        let specs = stmt
            .query_map([arrow_id], spec_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(specs)
    }

    /// Arrows whose manufacturer contains `name`, case-insensitively
    pub fn arrows_by_manufacturer(conn: &Connection, name: &str) -> Result<Vec<ArrowRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, manufacturer, model_name, material, carbon_content, arrow_type,
                        description, image_url, source_url, recommended_use, price_range
                 FROM arrows WHERE manufacturer LIKE ?1 ORDER BY model_name",
            )
            .map_err(from_rusqlite)?;
        let mut arrows = stmt
            .query_map([format!("%{name}%")], arrow_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        for arrow in &mut arrows {
            arrow.spine_specifications = Self::spine_specifications(conn, arrow.id)?;
        }
        Ok(arrows)
    }

    pub fn count_for_manufacturer(conn: &Connection, manufacturer: &str) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM arrows WHERE manufacturer = ?1",
            [manufacturer],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    pub fn statistics(conn: &Connection) -> Result<DatabaseStatistics> {
        let total_arrows: i64 = conn
            .query_row("SELECT COUNT(*) FROM arrows", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        let total_specifications: i64 = conn
            .query_row("SELECT COUNT(*) FROM spine_specifications", [], |row| {
                row.get(0)
            })
            .map_err(from_rusqlite)?;

        let mut stmt = conn
            .prepare(
                "SELECT manufacturer, COUNT(*) AS arrow_count,
                        SUM((SELECT COUNT(*) FROM spine_specifications WHERE arrow_id = arrows.id))
                 FROM arrows
                 GROUP BY manufacturer
                 ORDER BY arrow_count DESC, manufacturer",
            )
            .map_err(from_rusqlite)?;
        let manufacturers = stmt
            .query_map([], |row| {
                Ok(ManufacturerCount {
                    manufacturer: row.get(0)?,
                    arrow_count: row.get(1)?,
                    spec_count: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        let spine_range = conn
            .query_row(
                "SELECT MIN(spine), MAX(spine) FROM spine_specifications",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(from_rusqlite)?;
        let gpi_range = conn
            .query_row(
                "SELECT MIN(gpi_weight), MAX(gpi_weight) FROM spine_specifications
                 WHERE gpi_weight IS NOT NULL",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(from_rusqlite)?;
        let diameter_range = conn
            .query_row(
                "SELECT MIN(outer_diameter), MAX(outer_diameter) FROM spine_specifications
                 WHERE outer_diameter IS NOT NULL",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(from_rusqlite)?;

        let mut stmt = conn
            .prepare(
                "SELECT diameter_category, COUNT(*) AS n FROM spine_specifications
                 WHERE diameter_category IS NOT NULL
                 GROUP BY diameter_category ORDER BY n DESC, diameter_category",
            )
            .map_err(from_rusqlite)?;
        let diameter_categories = stmt
            .query_map([], |row| {
                Ok(CategoryCount {
                    diameter_category: row.get(0)?,
                    count: row.get(1)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(DatabaseStatistics {
            total_arrows,
            total_specifications,
            total_manufacturers: manufacturers.len(),
            manufacturers,
            spine_range,
            gpi_range,
            diameter_range,
            diameter_categories,
        })
    }
}

fn arrow_from_row(row: &Row<'_>) -> rusqlite::Result<ArrowRecord> {
    Ok(ArrowRecord {
        id: row.get(0)?,
        manufacturer: row.get(1)?,
        model_name: row.get(2)?,
        material: row.get(3)?,
        carbon_content: row.get(4)?,
        arrow_type: row.get(5)?,
        description: row.get(6)?,
        image_url: row.get(7)?,
        source_url: row.get(8)?,
        recommended_use: row.get(9)?,
        price_range: row.get(10)?,
        spine_specifications: Vec::new(),
    })
}

fn spec_from_row(row: &Row<'_>) -> rusqlite::Result<SpineSpecRecord> {
    let category: Option<String> = row.get(6)?;
    let lengths: Option<String> = row.get(7)?;
    Ok(SpineSpecRecord {
        id: row.get(0)?,
        arrow_id: row.get(1)?,
        spine: row.get(2)?,
        outer_diameter: row.get(3)?,
        inner_diameter: row.get(4)?,
        gpi_weight: row.get(5)?,
        diameter_category: category.as_deref().and_then(DiameterCategory::parse),
        length_options: parse_length_options(lengths.as_deref()),
        wall_thickness: row.get(8)?,
        insert_weight_range: row.get(9)?,
        nock_size: row.get(10)?,
        notes: row.get(11)?,
    })
}

/// Stored length options; anything that is not a JSON number list reads as empty
pub fn parse_length_options(raw: Option<&str>) -> Vec<f64> {
    raw.and_then(|s| serde_json::from_str::<Vec<f64>>(s).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spine_display() {
        assert_eq!(spine_display(Some("Carbon"), Some(300), Some(400)), "300-400");
        assert_eq!(spine_display(Some("Carbon"), Some(340), Some(340)), "340");
        assert_eq!(spine_display(Some("Wood"), Some(40), Some(45)), "40-45#");
        assert_eq!(spine_display(Some("wood"), Some(50), Some(50)), "50#");
        assert_eq!(spine_display(None, None, None), "N/A");
        assert_eq!(spine_display(Some("Carbon"), Some(0), Some(400)), "N/A");
    }

    #[test]
    fn test_parse_length_options() {
        assert_eq!(parse_length_options(Some("[29, 30.5]")), vec![29.0, 30.5]);
        assert!(parse_length_options(Some("29,30")).is_empty());
        assert!(parse_length_options(None).is_empty());
    }
}
