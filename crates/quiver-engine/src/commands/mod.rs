//! Engine commands.
//!
//! Each module wraps store and core calls for one area of the catalog and
//! owns the lifecycle logging for its public functions.

pub mod catalog;
pub mod matching;
pub mod migrate;
pub mod update;
pub mod validate;
