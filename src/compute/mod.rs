//! Compute layer for temporal filtering.
//!
//! This module holds the pure transformations applied to layer filters.
//! It is independent of any map or state store and only operates on
//! `FilterExpression` trees and decimal years.

pub mod temporal;
