//! # chronofilter-types
//!
//! Value types for filtering historical map features by date.
//!
//! - **Calendar types**: `CalendarDate`, `DateRange` and the decimal-year
//!   coordinate used to compare dates numerically
//! - **Durations**: `Duration`, a signed years/months/days step
//! - **Filters**: `FilterExpression`, the tree form of a style layer filter
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use chronofilter_types::date::CalendarDate;
//! use chronofilter_types::duration::Duration;
//!
//! let caesar = CalendarDate::parse_iso("-0044-03-15").unwrap();
//! assert_eq!(caesar.year(), -44);
//!
//! let step = Duration::parse("P1Y").unwrap();
//! let later = step.advance(caesar).unwrap();
//! assert_eq!(later.to_string(), "-0043-03-15");
//! ```

pub mod date;
pub mod duration;
pub mod filter;
