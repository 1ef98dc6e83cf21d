//! Temporal filter computation.
//!
//! - `constraint`: injecting and updating date bounds in layer filters

pub mod constraint;

pub use constraint::{DateConstraint, inject_date_constraint};
