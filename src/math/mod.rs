//! Mathematical utilities: nonlinear least squares.

pub mod lm;

pub use lm::*;
