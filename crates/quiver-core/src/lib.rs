//! Quiver Core - arrow catalog domain model and calculators
//!
//! This crate provides the storage-independent parts of Quiver:
//! - Arrow, spine specification, material and bow models with validation
//! - Spine chart calculator and front-of-center balance
//! - Arrow match scoring and recommendation reports
//! - Error taxonomy and the structured logging facility

pub mod errors;
pub mod logging_facility;
pub mod matching;
pub mod model;
pub mod spine;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, ModelError, Result};
pub use matching::{ArrowMatch, MatchRequest};
pub use model::{
    ArrowRecord, ArrowSpecification, ArrowType, BowConfiguration, BowType, DiameterCategory,
    Material, SpineSpecRecord, SpineSpecification,
};
pub use spine::{calculate_foc, calculate_required_spine, SpineRequest, SpineResult};
