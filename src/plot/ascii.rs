//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed step counts: `o`
//! - fitted curve: `-` line

use crate::domain::ScanRecord;

/// Render the scan profile with an optional fitted-curve overlay.
///
/// `curve_points` are `(step, value)` pairs sampled by the caller.
pub fn render_profile_plot(
    records: &[ScanRecord],
    curve_points: Option<&[(f64, f64)]>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = step_range(records, curve_points).unwrap_or((-0.5, 0.5));
    let (y_min, y_max) = value_range(records, curve_points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the curve first so observed points can overlay it.
    if let Some(curve) = curve_points {
        for &(x, y) in curve {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = '-';
        }
    }

    for r in records {
        let col = map_x(r.step as f64, x_min, x_max, width);
        let row = map_y(r.count, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: step=[{x_min:.1}, {x_max:.1}] | count=[{y_min:.1}, {y_max:.1}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn step_range(
    records: &[ScanRecord],
    curve_points: Option<&[(f64, f64)]>,
) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for r in records {
        min_x = min_x.min(r.step as f64);
        max_x = max_x.max(r.step as f64);
    }
    if let Some(curve) = curve_points {
        for &(x, _) in curve {
            if x.is_finite() {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
        }
    }
    (min_x.is_finite() && max_x.is_finite() && max_x > min_x).then_some((min_x, max_x))
}

fn value_range(
    records: &[ScanRecord],
    curve_points: Option<&[(f64, f64)]>,
) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for r in records {
        min_y = min_y.min(r.count);
        max_y = max_y.max(r.count);
    }
    if let Some(curve) = curve_points {
        for &(_, y) in curve {
            if y.is_finite() {
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }
    (min_y.is_finite() && max_y.is_finite() && max_y > min_y).then_some((min_y, max_y))
}

fn pad_range(min: f64, max: f64, fraction: f64) -> (f64, f64) {
    let span = (max - min).max(1e-12);
    (min - span * fraction, max + span * fraction)
}

fn map_x(x: f64, min: f64, max: f64, width: usize) -> usize {
    let u = ((x - min) / (max - min)).clamp(0.0, 1.0);
    ((u * (width as f64 - 1.0)).round() as usize).min(width - 1)
}

fn map_y(y: f64, min: f64, max: f64, height: usize) -> usize {
    let u = ((y - min) / (max - min)).clamp(0.0, 1.0);
    // Row 0 is the top of the plot.
    let row = ((1.0 - u) * (height as f64 - 1.0)).round() as usize;
    row.min(height - 1)
}
