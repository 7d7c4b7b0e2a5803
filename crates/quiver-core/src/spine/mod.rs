//! Spine calculation and arrow balance

mod charts;
pub mod calculator;
pub mod foc;

pub use calculator::{
    calculate_required_spine, spine_tolerance_range, Adjustment, Confidence, SpineRange,
    SpineRequest, SpineResult, SpineUnits,
};
pub use foc::{calculate_foc, FocInput, FocResult};
