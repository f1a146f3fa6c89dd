//! Synthetic peak-scan generation.
//!
//! Produces deterministic Gaussian-peak scans for demos and smoke tests,
//! plus a writer that emits them as a SPEC file so the whole
//! parse -> channels -> fit path can be exercised without beamline data.

use std::fs;
use std::path::Path;

use chrono::Local;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::error::ScanError;
use crate::models::GaussianLine;

/// Nominal level and spread of the synthetic monitor channel.
const MONITOR_LEVEL: f64 = 10_000.0;
const MONITOR_NOISE: f64 = 25.0;

/// Settings for one synthetic scan file.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// RNG seed; equal seeds produce identical data sections.
    pub seed: u64,
    /// Acquisition points per scan.
    pub points: usize,
    /// Gaussian noise standard deviation added to the detector channel.
    pub noise: f64,
    /// Number of scans to generate.
    pub scans: usize,
    /// Scanned motor range.
    pub x_min: f64,
    pub x_max: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            points: 101,
            noise: 0.5,
            scans: 1,
            x_min: -5.0,
            x_max: 5.0,
        }
    }
}

/// One generated scan: the ground truth and its sampled channels.
#[derive(Debug, Clone)]
pub struct SampleScan {
    pub number: u32,
    pub truth: GaussianLine,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub monitor: Vec<f64>,
}

/// Generate `config.scans` synthetic peak scans.
///
/// Peak parameters are drawn per scan from ranges that keep the peak well
/// inside the scanned window; everything is driven by the seeded RNG, so a
/// fixed config reproduces the same scans.
pub fn generate_scans(config: &SampleConfig) -> Result<Vec<SampleScan>, ScanError> {
    if config.points < 2 {
        return Err(ScanError::config("sample points must be >= 2"));
    }
    if config.scans == 0 {
        return Err(ScanError::config("sample scan count must be >= 1"));
    }
    if !(config.x_min.is_finite() && config.x_max.is_finite() && config.x_max > config.x_min) {
        return Err(ScanError::config("sample x range must be finite with x_max > x_min"));
    }
    if !config.noise.is_finite() || config.noise < 0.0 {
        return Err(ScanError::config("sample noise must be finite and >= 0"));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let detector_noise = Normal::new(0.0, config.noise)
        .map_err(|e| ScanError::config(format!("noise distribution: {e}")))?;
    let monitor_noise = Normal::new(0.0, MONITOR_NOISE)
        .map_err(|e| ScanError::config(format!("monitor distribution: {e}")))?;

    let span = config.x_max - config.x_min;
    let step = span / (config.points - 1) as f64;
    let mut scans = Vec::with_capacity(config.scans);

    for s in 0..config.scans {
        let truth = GaussianLine {
            offset: rng.gen_range(0.0..4.0),
            slope: rng.gen_range(-0.15..0.15),
            height: rng.gen_range(8.0..60.0),
            center: config.x_min + span * rng.gen_range(0.35..0.65),
            sigma: span * rng.gen_range(0.02..0.08),
        };

        let x: Vec<f64> = (0..config.points)
            .map(|i| config.x_min + i as f64 * step)
            .collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&x| truth.eval(x) + detector_noise.sample(&mut rng))
            .collect();
        let monitor: Vec<f64> = (0..config.points)
            .map(|_| MONITOR_LEVEL + monitor_noise.sample(&mut rng))
            .collect();

        scans.push(SampleScan {
            number: (s + 1) as u32,
            truth,
            x,
            y,
            monitor,
        });
    }

    Ok(scans)
}

/// Render scans as SPEC-format text with `motor`, `monitor` and `detector`
/// columns. The detector sits in the last column, where `fit` looks for y
/// by default.
pub fn render_spec_file(label: &str, scans: &[SampleScan]) -> String {
    let stamp = Local::now().format("%a %b %e %H:%M:%S %Y").to_string();
    let mut out = String::new();
    out.push_str(&format!("#F {label}\n"));
    out.push_str(&format!("#D {stamp}\n"));
    out.push_str("#C synthetic peak data\n");

    for scan in scans {
        let intervals = scan.x.len().saturating_sub(1);
        let (first, last) = match (scan.x.first(), scan.x.last()) {
            (Some(a), Some(b)) => (*a, *b),
            _ => (0.0, 0.0),
        };
        out.push('\n');
        out.push_str(&format!(
            "#S {}  ascan motor {first} {last} {intervals} 1\n",
            scan.number
        ));
        out.push_str(&format!("#D {stamp}\n"));
        out.push_str("#N 3\n");
        out.push_str("#L motor  monitor  detector\n");
        for i in 0..scan.x.len() {
            out.push_str(&format!("{} {} {}\n", scan.x[i], scan.monitor[i], scan.y[i]));
        }
    }

    out
}

/// Write scans to disk as a SPEC file.
pub fn write_spec_file(path: impl AsRef<Path>, scans: &[SampleScan]) -> Result<(), ScanError> {
    let path = path.as_ref();
    let text = render_spec_file(&path.display().to_string(), scans);
    fs::write(path, text).map_err(|e| ScanError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChannelSource, SpecChannels};
    use crate::fit::{CurveFit, GaussianFit};
    use crate::specfile::SpecFile;

    #[test]
    fn equal_seeds_reproduce_identical_scans() {
        let config = SampleConfig::default();
        let a = generate_scans(&config).unwrap();
        let b = generate_scans(&config).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].x, b[0].x);
        assert_eq!(a[0].y, b[0].y);
        assert_eq!(a[0].monitor, b[0].monitor);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_scans(&SampleConfig::default()).unwrap();
        let b = generate_scans(&SampleConfig {
            seed: 43,
            ..SampleConfig::default()
        })
        .unwrap();
        assert_ne!(a[0].y, b[0].y);
    }

    #[test]
    fn peak_stays_inside_the_scanned_window() {
        let config = SampleConfig {
            scans: 5,
            ..SampleConfig::default()
        };
        for scan in generate_scans(&config).unwrap() {
            assert!(scan.truth.center > config.x_min);
            assert!(scan.truth.center < config.x_max);
            assert!(scan.truth.sigma > 0.0);
        }
    }

    #[test]
    fn rendered_file_parses_back_with_expected_shape() {
        let config = SampleConfig {
            points: 61,
            scans: 2,
            ..SampleConfig::default()
        };
        let scans = generate_scans(&config).unwrap();
        let text = render_spec_file("demo.dat", &scans);

        let file = SpecFile::parse_str("demo.dat", &text).unwrap();
        assert_eq!(file.scans().len(), 2);
        assert!(file.date().is_some());

        let scan = file.scan_by_number(1).unwrap();
        assert_eq!(scan.labels(), ["motor", "monitor", "detector"]);
        assert_eq!(scan.points(), 61);
        assert!(scan.command().starts_with("ascan motor"));
        // The detector data must land in the last column.
        assert_eq!(scan.column(2).unwrap(), scans[0].y);
    }

    #[test]
    fn noiseless_sample_round_trips_through_parse_and_fit() {
        let config = SampleConfig {
            noise: 0.0,
            points: 61,
            ..SampleConfig::default()
        };
        let scans = generate_scans(&config).unwrap();
        let truth = scans[0].truth;

        let text = render_spec_file("demo.dat", &scans);
        let source = SpecChannels::from_file(SpecFile::parse_str("demo.dat", &text).unwrap());
        let x = source.channel("motor", 1).unwrap();
        let y = source.channel("detector", 1).unwrap();

        let report = GaussianFit::new().fit(&x, &y).unwrap();
        assert!(report.solver.status.is_converged());
        assert!((report.model.center - truth.center).abs() < 1e-4);
        assert!((report.model.sigma - truth.sigma).abs() < 1e-4);
        assert!((report.model.height - truth.height).abs() / truth.height < 1e-4);
    }

    #[test]
    fn bad_configs_are_rejected() {
        let bad_points = SampleConfig {
            points: 1,
            ..SampleConfig::default()
        };
        assert_eq!(generate_scans(&bad_points).unwrap_err().exit_code(), 2);

        let bad_range = SampleConfig {
            x_min: 2.0,
            x_max: 2.0,
            ..SampleConfig::default()
        };
        assert!(generate_scans(&bad_range).is_err());

        let bad_noise = SampleConfig {
            noise: -1.0,
            ..SampleConfig::default()
        };
        assert!(generate_scans(&bad_noise).is_err());
    }
}
