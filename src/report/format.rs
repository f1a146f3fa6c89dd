//! Reporting utilities: formatted terminal output.
//!
//! All user-facing text assembly lives here, so the parsing and fitting
//! code never touches presentation and output tweaks stay in one file.

use crate::data::ChannelMap;
use crate::domain::FitReport;
use crate::models::GaussianLine;
use crate::specfile::{SpecFile, SpecScan};

/// Format the scan inventory of one file.
pub fn format_scan_list(file: &SpecFile) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== scanfit - {} ===\n", file.name()));
    if let Some(date) = file.date() {
        out.push_str(&format!("File date: {date}\n"));
    }
    out.push_str(&format!("Scans: {}\n\n", file.scans().len()));

    out.push_str(&format!(
        "{:>6} {:>8} {:>9} {:<17} {:<}\n",
        "scan", "points", "channels", "date", "command"
    ));
    out.push_str(&format!(
        "{:->6} {:->8} {:->9} {:-<17} {:->7}\n",
        "", "", "", "", ""
    ));
    for scan in file.scans() {
        let date = scan
            .date()
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
        out.push_str(&format!(
            "{:>6} {:>8} {:>9} {:<17} {:<}\n",
            scan.number(),
            scan.points(),
            scan.labels().len(),
            date,
            truncate(scan.command(), 60),
        ));
    }

    out
}

/// Format the per-channel summary table for one scan.
pub fn format_channel_summary(scan: &SpecScan, channels: &ChannelMap) -> String {
    let mut out = String::new();

    out.push_str(&format!("Scan {}: {}\n", scan.number(), scan.command()));
    if let Some(date) = scan.date() {
        out.push_str(&format!("Date: {date}\n"));
    }
    out.push_str(&format!(
        "Channels: {} | points: {}\n\n",
        channels.len(),
        scan.points()
    ));

    out.push_str(&format!(
        "{:<20} {:>7} {:>14} {:>14} {:>14}\n",
        "channel", "n", "min", "max", "mean"
    ));
    out.push_str(&format!(
        "{:-<20} {:->7} {:->14} {:->14} {:->14}\n",
        "", "", "", "", ""
    ));
    for (name, values) in channels {
        match column_stats(values) {
            Some((lo, hi, mean)) => out.push_str(&format!(
                "{:<20} {:>7} {:>14.4} {:>14.4} {:>14.4}\n",
                truncate(name, 20),
                values.len(),
                lo,
                hi,
                mean,
            )),
            None => out.push_str(&format!(
                "{:<20} {:>7} {:>14} {:>14} {:>14}\n",
                truncate(name, 20),
                0,
                "-",
                "-",
                "-",
            )),
        }
    }

    out
}

/// Format the fit summary (scan metadata + fitted parameters + diagnostics).
pub fn format_fit_summary(
    source_file: &str,
    scan: &SpecScan,
    x_channel: &str,
    y_channel: &str,
    report: &FitReport<GaussianLine>,
) -> String {
    let mut out = String::new();
    let m = &report.model;

    out.push_str("=== scanfit - Gaussian peak fit ===\n");
    out.push_str(&format!("File: {source_file} (scan {})\n", scan.number()));
    out.push_str(&format!("Command: {}\n", scan.command()));
    if let Some(date) = scan.date() {
        out.push_str(&format!("Date: {date}\n"));
    }
    out.push_str(&format!(
        "Channels: x={x_channel} y={y_channel} (n={})\n",
        report.quality.n
    ));

    out.push_str("\nModel: offset + slope*x + height * exp(-((x-center)/sigma)^2 / 2)\n");
    out.push_str(&format!("- offset: {:.6}\n", m.offset));
    out.push_str(&format!("- slope : {:.6}\n", m.slope));
    out.push_str(&format!("- height: {:.6}\n", m.height));
    out.push_str(&format!("- center: {:.6}\n", m.center));
    out.push_str(&format!("- sigma : {:.6}\n", m.sigma));
    out.push_str(&format!("- FWHM  : {:.6}\n", report.fwhm));

    out.push_str(&format!(
        "\nQuality: SSE={:.6} RMSE={:.6} n={}\n",
        report.quality.sse, report.quality.rmse, report.quality.n
    ));
    out.push_str(&format!(
        "Solver : {} after {} iteration(s)\n",
        report.solver.status.display_name(),
        report.solver.iterations
    ));

    out
}

fn column_stats(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
        sum += v;
    }
    Some((lo, hi, sum / values.len() as f64))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChannelSource, SpecChannels};
    use crate::domain::{FitQuality, SolverSummary};
    use crate::math::LmStatus;

    const TEXT: &str = "#F demo.dat\n#D Thu Mar 14 09:26:53 2024\n\n#S 1  ascan motor 0 4 4 1\n#D Thu Mar 14 09:27:10 2024\n#N 2\n#L motor  det\n0 1\n1 2\n2 9\n3 2\n4 1\n";

    #[test]
    fn scan_list_shows_each_scan() {
        let file = SpecFile::parse_str("demo.dat", TEXT).unwrap();
        let text = format_scan_list(&file);
        assert!(text.starts_with("=== scanfit - demo.dat ==="));
        assert!(text.contains("Scans: 1"));
        assert!(text.contains("2024-03-14 09:27"));
        assert!(text.contains("ascan motor 0 4 4 1"));
    }

    #[test]
    fn channel_summary_has_stats_per_channel() {
        let file = SpecFile::parse_str("demo.dat", TEXT).unwrap();
        let scan = file.scan_by_number(1).unwrap();
        let channels = SpecChannels::from_file(file.clone()).channels(1).unwrap();
        let text = format_channel_summary(scan, &channels);
        assert!(text.contains("Channels: 2 | points: 5"));
        assert!(text.contains("motor"));
        assert!(text.contains("det"));
        assert!(text.contains("9.0000"));
    }

    #[test]
    fn fit_summary_reports_parameters_and_status() {
        let file = SpecFile::parse_str("demo.dat", TEXT).unwrap();
        let scan = file.scan_by_number(1).unwrap();
        let model = GaussianLine::new(1.0, 0.0, 8.0, 2.0, 0.5);
        let report = FitReport {
            fwhm: model.fwhm(),
            model,
            quality: FitQuality::from_sse(0.04, 5),
            solver: SolverSummary {
                status: LmStatus::Converged,
                iterations: 7,
            },
        };
        let text = format_fit_summary("demo.dat", scan, "motor", "det", &report);
        assert!(text.contains("File: demo.dat (scan 1)"));
        assert!(text.contains("- center: 2.000000"));
        assert!(text.contains("FWHM"));
        assert!(text.contains("converged after 7 iteration(s)"));
    }

    #[test]
    fn truncate_marks_long_commands() {
        assert_eq!(truncate("short", 10), "short");
        let long = "a".repeat(80);
        let cut = truncate(&long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('.'));
    }
}
