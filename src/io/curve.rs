//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fitted peak:
//! - model parameters and FWHM
//! - scan metadata (source file, scan number, command, channels)
//! - a precomputed fitted grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGrid, FitReport};
use crate::error::ScanError;
use crate::models::GaussianLine;
use crate::specfile::SpecScan;

/// Grid resolution used for the precomputed fitted curve.
const GRID_POINTS: usize = 101;

/// Assemble a curve file for one fitted scan.
pub fn build_curve_file(
    source_file: &str,
    scan: &SpecScan,
    x_channel: &str,
    y_channel: &str,
    x: &[f64],
    fit: &FitReport<GaussianLine>,
) -> CurveFile {
    CurveFile {
        tool: "scanfit".to_string(),
        source_file: source_file.to_string(),
        scan: scan.number(),
        command: scan.command().to_string(),
        scan_date: scan.date(),
        x_channel: x_channel.to_string(),
        y_channel: y_channel.to_string(),
        fit: fit.clone(),
        grid: build_grid(&fit.model, x, GRID_POINTS),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), ScanError> {
    let file = File::create(path).map_err(|e| ScanError::io(path, e))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| ScanError::format(path.display().to_string(), e.line(), format!("curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, ScanError> {
    let file = File::open(path).map_err(|e| ScanError::io(path, e))?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| ScanError::format(path.display().to_string(), e.line(), format!("curve JSON: {e}")))?;
    Ok(curve)
}

/// Evaluate the model on an even grid over the observed x range.
///
/// Degenerate ranges fall back to a window around the fitted peak so the
/// grid is always usable for plotting.
pub fn build_grid(model: &GaussianLine, x: &[f64], n: usize) -> CurveGrid {
    let n = n.max(2);
    let mut x0 = f64::INFINITY;
    let mut x1 = f64::NEG_INFINITY;
    for &v in x {
        if v.is_finite() {
            x0 = x0.min(v);
            x1 = x1.max(v);
        }
    }
    if !(x0.is_finite() && x1.is_finite()) || x1 <= x0 {
        let half = (4.0 * model.sigma.abs()).max(0.5);
        x0 = model.center - half;
        x1 = model.center + half;
    }

    let mut grid_x = Vec::with_capacity(n);
    let mut y_fit = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let xv = x0 + u * (x1 - x0);
        grid_x.push(xv);
        y_fit.push(model.eval(xv));
    }

    CurveGrid { x: grid_x, y_fit }
}
