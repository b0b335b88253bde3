//! Threshold and window predicates over catalogs and series.
//!
//! A predicate that refers to a column absent from the whole catalog is a
//! no-op. Filters never fail.

use serde::{Deserialize, Serialize};

use crate::domain::{SeismicCatalog, SeismicEvent, SeriesPoint};

/// Optional, AND-composed catalog predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Keep events with `magnitude >= min_magnitude`.
    pub min_magnitude: Option<f64>,
    /// Keep events with `depth_km <= max_depth_km`.
    pub max_depth_km: Option<f64>,
    /// After the thresholds, keep only the chronologically-last N events.
    pub last_n: Option<usize>,
}

impl CatalogFilter {
    pub fn min_magnitude(mut self, value: f64) -> Self {
        self.min_magnitude = Some(value);
        self
    }

    pub fn max_depth_km(mut self, value: f64) -> Self {
        self.max_depth_km = Some(value);
        self
    }

    pub fn last_n(mut self, n: usize) -> Self {
        self.last_n = Some(n);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min_magnitude.is_none() && self.max_depth_km.is_none() && self.last_n.is_none()
    }
}

/// Apply `filter` to `catalog`, preserving the original event order.
pub fn filter_catalog(catalog: &SeismicCatalog, filter: &CatalogFilter) -> SeismicCatalog {
    // Column presence is judged on the unfiltered catalog.
    let magnitude_bound = filter.min_magnitude.filter(|_| catalog.has_magnitude());
    let depth_bound = filter.max_depth_km.filter(|_| catalog.has_depth());

    let mut events: Vec<SeismicEvent> = catalog
        .events
        .iter()
        .filter(|e| match magnitude_bound {
            Some(min) => e.magnitude.is_some_and(|m| m >= min),
            None => true,
        })
        .filter(|e| match depth_bound {
            Some(max) => e.depth_km.is_some_and(|d| d <= max),
            None => true,
        })
        .cloned()
        .collect();

    if let Some(n) = filter.last_n {
        events = take_last_events(events, n);
    }

    SeismicCatalog::new(events)
}

/// Keep the chronologically-last `n` events (clamped to `[1, len]`) in their
/// original relative order.
///
/// Uses timestamps when every event has one, otherwise source position.
fn take_last_events(events: Vec<SeismicEvent>, n: usize) -> Vec<SeismicEvent> {
    if events.is_empty() {
        return events;
    }
    let n = n.clamp(1, events.len());
    if n == events.len() {
        return events;
    }

    let all_timestamped = events.iter().all(|e| e.timestamp.is_some());
    if !all_timestamped {
        let start = events.len() - n;
        return events.into_iter().skip(start).collect();
    }

    // Rank by (timestamp, position) so ties keep the later-listed event.
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&i| (events[i].timestamp, i));
    let mut keep = vec![false; events.len()];
    for &i in &order[order.len() - n..] {
        keep[i] = true;
    }

    events
        .into_iter()
        .zip(keep)
        .filter_map(|(event, kept)| kept.then_some(event))
        .collect()
}

/// Trailing window of an indicator series (`n` clamped to `[1, len]`).
pub fn last_points(points: &[SeriesPoint], n: usize) -> &[SeriesPoint] {
    if points.is_empty() {
        return points;
    }
    let n = n.clamp(1, points.len());
    &points[points.len() - n..]
}
