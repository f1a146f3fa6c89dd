//! ASCII plotting for terminal output.
//!
//! A fixed-size character grid with no styling and nothing adaptive. The
//! renderer stays deterministic (golden tests compare full frames) and is
//! good enough to eyeball a fit without leaving the terminal.
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curve: `-` line
//! - fitted peak center: `+` (when it lies inside the x range)

use crate::domain::CurveFile;
use crate::models::GaussianLine;

/// Render observed data with the fitted curve overlaid.
pub fn render_fit_plot(
    x: &[f64],
    y: &[f64],
    model: &GaussianLine,
    width: usize,
    height: usize,
) -> String {
    let (x_min, x_max) = x_range(x).unwrap_or_else(|| center_window(model));
    let curve = sample_curve(model, x_min, x_max, width.max(2));
    let points: Vec<(f64, f64)> = x.iter().zip(y).map(|(&x, &y)| (x, y)).collect();
    render_plot(&points, &curve, Some(model.center), x_min, x_max, width, height)
}

/// Render a saved curve JSON file (curve only, no overlay points).
pub fn render_curve_file_plot(curve: &CurveFile, width: usize, height: usize) -> String {
    let (x_min, x_max) = x_range(&curve.grid.x).unwrap_or_else(|| center_window(&curve.fit.model));
    let points: Vec<(f64, f64)> = curve
        .grid
        .x
        .iter()
        .zip(&curve.grid.y_fit)
        .map(|(&x, &y)| (x, y))
        .collect();
    render_plot(
        &[],
        &points,
        Some(curve.fit.model.center),
        x_min,
        x_max,
        width,
        height,
    )
}

fn render_plot(
    observed: &[(f64, f64)],
    curve: &[(f64, f64)],
    center: Option<f64>,
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    // y range covers observed points and the sampled curve.
    let (y_min, y_max) = y_range(observed, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first, then points, then the center marker on top.
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);

    for &(px, py) in observed {
        if !(px.is_finite() && py.is_finite()) {
            continue;
        }
        let col = map_x(px, x_min, x_max, width);
        let row = map_y(py, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    if let Some(c) = center {
        if c >= x_min && c <= x_max {
            if let Some(cy) = curve_value_at(curve, c) {
                let col = map_x(c, x_min, x_max, width);
                let row = map_y(cy, y_min, y_max, height);
                grid[row][col] = '+';
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn x_range(x: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in x {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some((lo, hi))
    } else {
        None
    }
}

fn center_window(model: &GaussianLine) -> (f64, f64) {
    let half = (4.0 * model.sigma.abs()).max(0.5);
    (model.center - half, model.center + half)
}

fn sample_curve(model: &GaussianLine, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let x = x_min + u * (x_max - x_min);
        out.push((x, model.eval(x)));
    }
    out
}

fn curve_value_at(curve: &[(f64, f64)], x: f64) -> Option<f64> {
    curve
        .iter()
        .min_by(|a, b| {
            let da = (a.0 - x).abs();
            let db = (b.0 - x).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|&(_, y)| y)
}

fn y_range(observed: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &(_, y) in observed.iter().chain(curve) {
        if y.is_finite() {
            lo = lo.min(y);
            hi = hi.max(y);
        }
    }
    if lo.is_finite() && hi.is_finite() && hi > lo {
        Some((lo, hi))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // row 0 is the top of the grid
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Bresenham-style integer line walk; only blank cells are painted.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
