//! Arrow matching: request shaping, scoring and the text report
//!
//! The catalog search itself lives in the engine; everything here is pure.

pub mod report;
pub mod request;
pub mod scoring;

pub use report::recommendation_report;
pub use request::{canonical_manufacturer, wood_species_manufacturers, MatchRequest};
pub use scoring::{diversify, evaluate_arrow, ArrowMatch};
