//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module does the actual work of the
//! binary:
//! - parses CLI arguments
//! - loads SPEC files and resolves channels
//! - runs the Gaussian peak fit
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{ChannelsArgs, Cli, Command, FitArgs, PlotArgs, SampleArgs, ScansArgs};
use crate::data::{ChannelSource, SampleConfig, SpecChannels};
use crate::error::ScanError;
use crate::fit::{CurveFit, GaussianFit};
use crate::math::LmOptions;
use crate::specfile::SpecFile;

/// Entry point for the `scanfit` binary.
pub fn run() -> Result<(), ScanError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scans(args) => handle_scans(args),
        Command::Channels(args) => handle_channels(args),
        Command::Fit(args) => handle_fit(args),
        Command::Sample(args) => handle_sample(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_scans(args: ScansArgs) -> Result<(), ScanError> {
    let file = SpecFile::open(&args.file)?;
    println!("{}", crate::report::format_scan_list(&file));
    Ok(())
}

fn handle_channels(args: ChannelsArgs) -> Result<(), ScanError> {
    let source = SpecChannels::open(&args.file)?;
    let channels = source.channels(args.scan)?;

    match &args.channel {
        Some(name) => {
            let values = source.channel(name, args.scan)?;
            for v in values {
                println!("{v}");
            }
        }
        None => {
            let scan = source.file().scan_by_number(args.scan)?;
            println!("{}", crate::report::format_channel_summary(scan, &channels));
        }
    }

    if let Some(path) = &args.export_csv {
        crate::io::write_channels_csv(path, &channels)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), ScanError> {
    let source = SpecChannels::open(&args.file)?;
    let scan = source.file().scan_by_number(args.scan)?;
    let (x_name, y_name) =
        resolve_fit_channels(scan.labels(), args.x_channel.as_deref(), args.y_channel.as_deref())?;

    let x = source.channel(&x_name, args.scan)?;
    let y = source.channel(&y_name, args.scan)?;

    let options = LmOptions {
        max_iterations: args.max_iterations,
        ..LmOptions::default()
    };
    let report = GaussianFit::with_options(options).fit(&x, &y)?;

    println!(
        "{}",
        crate::report::format_fit_summary(source.file().name(), scan, &x_name, &y_name, &report)
    );

    if args.plot && !args.no_plot {
        println!(
            "{}",
            crate::plot::render_fit_plot(&x, &y, &report.model, args.width, args.height)
        );
    }

    if let Some(path) = &args.export_curve {
        let curve =
            crate::io::build_curve_file(source.file().name(), scan, &x_name, &y_name, &x, &report);
        crate::io::write_curve_json(path, &curve)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), ScanError> {
    let config = SampleConfig {
        seed: args.seed,
        points: args.points,
        noise: args.noise,
        scans: args.scans,
        x_min: args.x_min,
        x_max: args.x_max,
    };
    let scans = crate::data::generate_scans(&config)?;
    crate::data::write_spec_file(&args.out, &scans)?;

    println!("Wrote {} scan(s) to {}", scans.len(), args.out.display());
    for scan in &scans {
        let t = &scan.truth;
        println!(
            "  scan {}: center={:.4} sigma={:.4} height={:.4} fwhm={:.4}",
            scan.number,
            t.center,
            t.sigma,
            t.height,
            t.fwhm()
        );
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), ScanError> {
    let curve = crate::io::read_curve_json(&args.curve)?;
    println!(
        "{}",
        crate::plot::render_curve_file_plot(&curve, args.width, args.height)
    );
    Ok(())
}

/// Pick the x/y channels for a fit.
///
/// Explicit names win; otherwise the first column is the scanned motor and
/// the last column is the detector, which is the usual SPEC layout.
fn resolve_fit_channels(
    labels: &[String],
    x_channel: Option<&str>,
    y_channel: Option<&str>,
) -> Result<(String, String), ScanError> {
    if let (Some(x), Some(y)) = (x_channel, y_channel) {
        return Ok((x.to_string(), y.to_string()));
    }
    if labels.len() < 2 {
        return Err(ScanError::fit_input(
            "scan has fewer than two channels; pass --x-channel and --y-channel explicitly",
        ));
    }
    let x = x_channel.map_or_else(|| labels[0].clone(), str::to_string);
    let y = y_channel.map_or_else(|| labels[labels.len() - 1].clone(), str::to_string);
    Ok((x, y))
}
