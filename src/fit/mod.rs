//! Curve fitting.
//!
//! Responsibilities:
//!
//! - validate `(x, y)` samples before solving
//! - run the Levenberg-Marquardt refinement from a data-derived guess
//! - package parameters, peak width, quality, and solver status

pub mod fitter;

pub use fitter::*;
