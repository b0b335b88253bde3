//! Descriptive statistics over indicator series and seismic catalogs.
//!
//! All functions are pure. Empty inputs produce `None` rather than NaN or a
//! panic, so callers have to decide what to show when there is no data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{IndicatorCode, IndicatorSeries, SeismicCatalog, SeriesPoint};
use crate::filter::{CatalogFilter, filter_catalog};

/// Number of histogram bins used for magnitude distributions.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
/// Events counted as "recent" on the dashboard.
pub const RECENT_EVENTS_WINDOW: usize = 7;
/// Events averaged for the dashboard's recent magnitude.
pub const RECENT_MAGNITUDE_WINDOW: usize = 10;
/// Events shown by default and binned into the dashboard histogram.
pub const SEISMIC_DISPLAY_WINDOW: usize = 50;

/// Count, moments, extremes and quartiles of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1 denominator); NaN when `count < 2`.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

/// Describe a sample. `None` when empty.
pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let std = if sorted.len() < 2 {
        f64::NAN
    } else {
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    };

    Some(DescriptiveStats {
        count: sorted.len(),
        mean,
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p25: quantile_sorted(&sorted, 0.25),
        p50: quantile_sorted(&sorted, 0.50),
        p75: quantile_sorted(&sorted, 0.75),
    })
}

pub fn describe_points(points: &[SeriesPoint]) -> Option<DescriptiveStats> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    describe(&values)
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Percent change from first to last point.
///
/// `None` with fewer than two points or when the first value is zero.
pub fn percent_change(points: &[SeriesPoint]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let first = points.first()?.value;
    let last = points.last()?.value;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Change between the last two points; `0.0` for a single point.
pub fn latest_delta(points: &[SeriesPoint]) -> Option<f64> {
    let last = points.last()?;
    let prev = if points.len() >= 2 {
        &points[points.len() - 2]
    } else {
        last
    };
    Some(last.value - prev.value)
}

/// One side of a two-series comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSide {
    pub code: IndicatorCode,
    pub name: String,
    pub points: Vec<SeriesPoint>,
    pub stats: DescriptiveStats,
}

impl ComparisonSide {
    fn from_series(series: &IndicatorSeries) -> Option<Self> {
        Some(Self {
            code: series.code,
            name: series.name.clone(),
            points: series.points.clone(),
            stats: describe_points(&series.points)?,
        })
    }

    /// Own value axis for this side.
    pub fn value_range(&self) -> (f64, f64) {
        (self.stats.min, self.stats.max)
    }
}

/// Two series sharing a date axis, each keeping its own value axis.
///
/// Dates are not joined or interpolated; each side keeps all its points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesComparison {
    pub left: ComparisonSide,
    pub right: ComparisonSide,
    /// Union of both series' date spans.
    pub date_range: (NaiveDate, NaiveDate),
}

pub fn compare(left: &IndicatorSeries, right: &IndicatorSeries) -> Option<SeriesComparison> {
    let (l_start, l_end) = left.date_range()?;
    let (r_start, r_end) = right.date_range()?;
    Some(SeriesComparison {
        left: ComparisonSide::from_series(left)?,
        right: ComparisonSide::from_series(right)?,
        date_range: (l_start.min(r_start), l_end.max(r_end)),
    })
}

/// Headline numbers for a seismic catalog. Each field is `None` when the
/// underlying column is absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub count: usize,
    pub mean_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    pub mean_depth_km: Option<f64>,
}

pub fn summarize_catalog(catalog: &SeismicCatalog) -> CatalogSummary {
    let magnitudes = describe(&catalog.magnitudes());
    let depths = describe(&catalog.depths());
    CatalogSummary {
        count: catalog.len(),
        mean_magnitude: magnitudes.map(|s| s.mean),
        max_magnitude: magnitudes.map(|s| s.max),
        mean_depth_km: depths.map(|s| s.mean),
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub lower: f64,
    pub upper: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    /// `[start, end)` of bin `idx` (the last bin includes `upper`).
    pub fn bin_edges(&self, idx: usize) -> (f64, f64) {
        let w = self.bin_width();
        (self.lower + w * idx as f64, self.lower + w * (idx + 1) as f64)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if bins == 0 {
        return None;
    }
    let stats = describe(values)?;
    let (lower, upper) = if stats.max > stats.min {
        (stats.min, stats.max)
    } else {
        (stats.min - 0.5, stats.max + 0.5)
    };

    let width = (upper - lower) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lower) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(Histogram { lower, upper, counts })
}

/// Distribution of magnitudes; `None` when no event has one.
pub fn magnitude_histogram(catalog: &SeismicCatalog, bins: usize) -> Option<Histogram> {
    histogram(&catalog.magnitudes(), bins)
}

/// Dashboard view of the catalog's most recent events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicSnapshot {
    /// Events in the whole catalog.
    pub total: usize,
    /// Events among the last `RECENT_EVENTS_WINDOW`.
    pub recent_count: usize,
    /// Mean magnitude over the last `RECENT_MAGNITUDE_WINDOW` events.
    pub recent_mean_magnitude: Option<f64>,
    /// Magnitudes of the last `SEISMIC_DISPLAY_WINDOW` events.
    pub histogram: Option<Histogram>,
}

pub fn seismic_snapshot(catalog: &SeismicCatalog, bins: usize) -> SeismicSnapshot {
    let tail = |n: usize| filter_catalog(catalog, &CatalogFilter::default().last_n(n));
    SeismicSnapshot {
        total: catalog.len(),
        recent_count: tail(RECENT_EVENTS_WINDOW).len(),
        recent_mean_magnitude: describe(&tail(RECENT_MAGNITUDE_WINDOW).magnitudes()).map(|s| s.mean),
        histogram: magnitude_histogram(&tail(SEISMIC_DISPLAY_WINDOW), bins),
    }
}
