//! Command-line parsing for the scan-file peak fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the parsing/fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "scanfit", version, about = "SPEC scan-file channel reader and Gaussian peak fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the scans recorded in a SPEC file.
    Scans(ScansArgs),
    /// Summarize the channels of one scan, or dump a single channel.
    Channels(ChannelsArgs),
    /// Fit a Gaussian-plus-line peak to one scan and report the parameters.
    Fit(FitArgs),
    /// Generate a synthetic SPEC file with Gaussian peaks.
    Sample(SampleArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
}

/// Options for listing scans.
#[derive(Debug, Parser, Clone)]
pub struct ScansArgs {
    /// SPEC data file.
    #[arg(short = 'f', long, value_name = "SPEC")]
    pub file: PathBuf,
}

/// Options for inspecting channels.
#[derive(Debug, Parser, Clone)]
pub struct ChannelsArgs {
    /// SPEC data file.
    #[arg(short = 'f', long, value_name = "SPEC")]
    pub file: PathBuf,

    /// Scan number (as written after #S).
    #[arg(short = 's', long)]
    pub scan: u32,

    /// Print the values of one channel instead of the summary table.
    #[arg(short = 'c', long)]
    pub channel: Option<String>,

    /// Export every channel of the scan to CSV.
    #[arg(long = "export-csv", value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

/// Options for fitting a peak.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// SPEC data file.
    #[arg(short = 'f', long, value_name = "SPEC")]
    pub file: PathBuf,

    /// Scan number (as written after #S).
    #[arg(short = 's', long)]
    pub scan: u32,

    /// X channel (defaults to the first column).
    #[arg(short = 'x', long = "x-channel", value_name = "NAME")]
    pub x_channel: Option<String>,

    /// Y channel (defaults to the last column).
    #[arg(short = 'y', long = "y-channel", value_name = "NAME")]
    pub y_channel: Option<String>,

    /// Solver iteration cap.
    #[arg(long, default_value_t = 100)]
    pub max_iterations: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the fitted curve (model + params + fitted grid) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

/// Options for generating synthetic data.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output SPEC file path.
    #[arg(short = 'o', long, value_name = "SPEC")]
    pub out: PathBuf,

    /// Random seed (equal seeds reproduce the same file body).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Acquisition points per scan.
    #[arg(long, default_value_t = 101)]
    pub points: usize,

    /// Detector noise standard deviation.
    #[arg(long, default_value_t = 0.5)]
    pub noise: f64,

    /// Number of scans to generate.
    #[arg(long, default_value_t = 1)]
    pub scans: usize,

    /// Lower edge of the scanned motor range.
    #[arg(long, default_value_t = -5.0, allow_hyphen_values = true)]
    pub x_min: f64,

    /// Upper edge of the scanned motor range.
    #[arg(long, default_value_t = 5.0, allow_hyphen_values = true)]
    pub x_max: f64,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `scanfit fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
