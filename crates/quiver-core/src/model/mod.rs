//! Domain model: arrows, spine specifications, materials, bows and scrape sessions

pub mod arrow;
pub mod bow;
pub mod material;
pub mod record;
pub mod session;
pub mod spine;

pub use arrow::{ArrowSpecification, ArrowType, SCRAPER_VERSION};
pub use bow::{BowConfiguration, BowType, CamType, RestType};
pub use material::{normalize_material, suggest_material_mapping, Material};
pub use record::{ArrowRecord, SpineSpecRecord};
pub use session::{ScrapingResult, ScrapingSession};
pub use spine::{classify_diameter, DiameterCategory, SpineSpecification};
