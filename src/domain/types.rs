//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::math::LmStatus;
use crate::models::GaussianLine;

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
}

impl FitQuality {
    /// Derive quality figures from a sum of squared residuals over `n`
    /// observations.
    pub fn from_sse(sse: f64, n: usize) -> Self {
        let rmse = if n > 0 { (sse / n as f64).sqrt() } else { f64::NAN };
        Self { sse, rmse, n }
    }
}

/// How the underlying solver finished, surfaced alongside every fit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolverSummary {
    pub status: LmStatus,
    pub iterations: usize,
}

/// Fit output for a single model.
///
/// `model` carries the refined parameters; `fwhm` is the derived peak width
/// for peak-shaped models. Non-convergence is visible in `solver`, not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport<M> {
    pub model: M,
    /// Full width at half maximum derived from the fitted parameters.
    pub fwhm: f64,
    pub quality: FitQuality,
    pub solver: SolverSummary,
}

/// A saved fitted-curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    /// SPEC file the data came from (path or in-memory label).
    pub source_file: String,
    pub scan: u32,
    /// Scan command line, as recorded on the `#S` line.
    pub command: String,
    pub scan_date: Option<NaiveDateTime>,
    pub x_channel: String,
    pub y_channel: String,
    pub fit: FitReport<GaussianLine>,
    pub grid: CurveGrid,
}

/// Fitted curve sampled on a dense grid for plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub y_fit: Vec<f64>,
}
