//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - fit outputs (`FitReport`, `FitQuality`, `SolverSummary`)
//! - the saved-curve export schema (`CurveFile`, `CurveGrid`)

pub mod types;

pub use types::*;
