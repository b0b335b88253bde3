//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids, deterministic output (helpful for golden tests).
//!
//! Plot elements:
//! - series line: `*` (second series in comparisons: `+`)
//! - area fill: `:`
//! - bars: `#`
//! - scatter markers: `o`

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::domain::{ChartKind, SeismicCatalog, SeriesPoint};
use crate::stats::{Histogram, SeriesComparison};

const MIN_WIDTH: usize = 10;
const MIN_HEIGHT: usize = 5;

/// Render one indicator series in the requested chart style.
pub fn render_series_chart(points: &[SeriesPoint], kind: ChartKind, width: usize, height: usize) -> String {
    let shown = kind.window(points);
    let (Some(first), Some(last)) = (shown.first(), shown.last()) else {
        return "(sin datos)\n".to_string();
    };

    let width = width.max(MIN_WIDTH);
    let height = height.max(MIN_HEIGHT);
    let (t_min, t_max) = x_range(first.date, last.date);
    let (y_min, y_max) = y_range(shown).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let cells: Vec<(usize, usize)> = shown
        .iter()
        .map(|p| {
            (
                map_x(day_number(p.date), t_min, t_max, width),
                map_y(p.value, y_min, y_max, height),
            )
        })
        .collect();

    match kind {
        ChartKind::Line => draw_polyline(&mut grid, &cells, '*'),
        ChartKind::Area => {
            draw_polyline(&mut grid, &cells, '*');
            fill_below(&mut grid, ':');
        }
        ChartKind::Bar => {
            for &(x, y) in &cells {
                for row in grid.iter_mut().skip(y) {
                    row[x] = '#';
                }
            }
        }
    }

    let mut out = format!(
        "Plot: dates=[{}, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        first.date, last.date
    );
    push_grid(&mut out, grid);
    out
}

/// Render two series on a shared date axis, each scaled to its own value axis.
pub fn render_comparison(cmp: &SeriesComparison, width: usize, height: usize) -> String {
    let width = width.max(MIN_WIDTH);
    let height = height.max(MIN_HEIGHT);
    let (t_min, t_max) = x_range(cmp.date_range.0, cmp.date_range.1);

    let mut grid = vec![vec![' '; width]; height];
    let mut out = format!("Plot: dates=[{}, {}]\n", cmp.date_range.0, cmp.date_range.1);

    for (side, ch) in [(&cmp.left, '*'), (&cmp.right, '+')] {
        let (lo, hi) = side.value_range();
        let (lo, hi) = pad_range(lo, hi, 0.05);
        let cells: Vec<(usize, usize)> = side
            .points
            .iter()
            .map(|p| {
                (
                    map_x(day_number(p.date), t_min, t_max, width),
                    map_y(p.value, lo, hi, height),
                )
            })
            .collect();
        draw_polyline(&mut grid, &cells, ch);
        out.push_str(&format!("  {ch} {}: y=[{lo:.2}, {hi:.2}]\n", side.name));
    }

    push_grid(&mut out, grid);
    out
}

/// Magnitude (y) against depth in km (x), one `o` per event carrying both.
pub fn render_scatter(catalog: &SeismicCatalog, width: usize, height: usize) -> String {
    let pairs: Vec<(f64, f64)> = catalog
        .events
        .iter()
        .filter_map(|e| Some((e.depth_km?, e.magnitude?)))
        .collect();
    let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (
        value_range(pairs.iter().map(|p| p.0)),
        value_range(pairs.iter().map(|p| p.1)),
    ) else {
        return "(sin datos)\n".to_string();
    };

    let width = width.max(MIN_WIDTH);
    let height = height.max(MIN_HEIGHT);
    let (x_lo, x_hi) = pad_range(x_lo, x_hi, 0.05);
    let (y_lo, y_hi) = pad_range(y_lo, y_hi, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for &(depth, magnitude) in &pairs {
        let x = map_x(depth, x_lo, x_hi, width);
        let y = map_y(magnitude, y_lo, y_hi, height);
        grid[y][x] = 'o';
    }

    let mut out = format!(
        "Plot: profundidad=[{x_lo:.2}, {x_hi:.2}] km | magnitud=[{y_lo:.2}, {y_hi:.2}]\n"
    );
    push_grid(&mut out, grid);
    out
}

/// Magnitude over time, events ordered by timestamp. Events without a
/// timestamp or magnitude are left out.
pub fn render_magnitude_timeline(catalog: &SeismicCatalog, width: usize, height: usize) -> String {
    let mut events: Vec<(NaiveDateTime, f64)> = catalog
        .events
        .iter()
        .filter_map(|e| Some((e.timestamp?, e.magnitude?)))
        .collect();
    events.sort_by_key(|&(ts, _)| ts);

    let (Some(&(first, _)), Some(&(last, _))) = (events.first(), events.last()) else {
        return "(sin datos)\n".to_string();
    };
    let Some((y_lo, y_hi)) = value_range(events.iter().map(|e| e.1)) else {
        return "(sin datos)\n".to_string();
    };

    let width = width.max(MIN_WIDTH);
    let height = height.max(MIN_HEIGHT);
    let seconds = |ts: NaiveDateTime| ts.and_utc().timestamp() as f64;
    let (t0, t1) = (seconds(first), seconds(last));
    let (t_min, t_max) = if t1 > t0 { (t0, t1) } else { (t0 - 1.0, t0 + 1.0) };
    let (y_lo, y_hi) = pad_range(y_lo, y_hi, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let cells: Vec<(usize, usize)> = events
        .iter()
        .map(|&(ts, m)| (map_x(seconds(ts), t_min, t_max, width), map_y(m, y_lo, y_hi, height)))
        .collect();
    draw_polyline(&mut grid, &cells, '*');

    let mut out = format!(
        "Plot: fechas=[{}, {}] | magnitud=[{y_lo:.2}, {y_hi:.2}]\n",
        first.format("%Y-%m-%d %H:%M"),
        last.format("%Y-%m-%d %H:%M")
    );
    push_grid(&mut out, grid);
    out
}

/// Horizontal bar rendering of a histogram, one line per bin.
pub fn render_histogram(hist: &Histogram, bar_width: usize) -> String {
    let bar_width = bar_width.max(1);
    let peak = hist.counts.iter().copied().max().unwrap_or(0).max(1);

    let mut out = String::new();
    for (idx, &count) in hist.counts.iter().enumerate() {
        let (lo, hi) = hist.bin_edges(idx);
        let len = (count * bar_width).div_ceil(peak);
        let line = format!("{lo:>6.2} - {hi:<6.2} | {} {count}", "#".repeat(len));
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// One-line sparkline of the values (`▁` lowest, `█` highest).
pub fn render_sparkline(points: &[SeriesPoint]) -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let Some((lo, hi)) = y_range(points) else {
        return String::new();
    };
    let span = hi - lo;
    points
        .iter()
        .map(|p| {
            if span <= 0.0 {
                return LEVELS[LEVELS.len() / 2];
            }
            let u = ((p.value - lo) / span).clamp(0.0, 1.0);
            LEVELS[(u * (LEVELS.len() - 1) as f64).round() as usize]
        })
        .collect()
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_range(start: NaiveDate, end: NaiveDate) -> (f64, f64) {
    let (t0, t1) = (day_number(start), day_number(end));
    if t1 > t0 { (t0, t1) } else { (t0 - 1.0, t0 + 1.0) }
}

fn y_range(points: &[SeriesPoint]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_y = min_y.min(p.value);
        max_y = max_y.max(p.value);
    }
    if min_y.is_finite() && max_y.is_finite() {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { min.abs().max(1.0) * frac };
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], cells: &[(usize, usize)], ch: char) {
    let mut prev = None;
    for &(x, y) in cells {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => {
                if grid[y][x] == ' ' {
                    grid[y][x] = ch;
                }
            }
        }
        prev = Some((x, y));
    }
}

/// Fill every cell below the top-most mark of each column.
fn fill_below(grid: &mut [Vec<char>], ch: char) {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);
    for x in 0..width {
        if let Some(top) = (0..height).find(|&y| grid[y][x] != ' ') {
            for row in grid.iter_mut().skip(top + 1) {
                if row[x] == ' ' {
                    row[x] = ch;
                }
            }
        }
    }
}

/// Integer line drawing (Bresenham-ish).
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
