//! Raw JSON payloads to typed series and catalogs.
//!
//! Rules:
//! - indicator rows with an unusable `fecha` or `valor` are dropped, never zeroed
//! - seismic fields are coerced one by one; a bad field becomes `None`
//! - a missing or empty indicator `serie` yields `None`, not a partial series

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{IndicatorCode, IndicatorSeries, SeismicCatalog, SeismicEvent, SeriesPoint};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Build an `IndicatorSeries` from an indicator API payload.
pub fn normalize_indicator(code: IndicatorCode, raw: &Value) -> Option<IndicatorSeries> {
    let rows = raw.get("serie")?.as_array()?;

    let mut points = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        match parse_indicator_row(row) {
            Some(point) => points.push(point),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(%code, dropped, kept = points.len(), "dropped unusable indicator rows");
    }
    if points.is_empty() {
        return None;
    }

    // Stable: rows sharing a date keep their payload order.
    points.sort_by_key(|p| p.date);

    let name = raw
        .get("nombre")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(code.display_name())
        .to_string();

    Some(IndicatorSeries { code, name, points })
}

fn parse_indicator_row(row: &Value) -> Option<SeriesPoint> {
    let date = parse_datetime(row.get("fecha")?)?.date();
    let value = coerce_f64(row.get("valor")?)?;
    Some(SeriesPoint { date, value })
}

/// Build a `SeismicCatalog` from the seismic API payload.
///
/// Anything other than a JSON array yields an empty catalog.
pub fn normalize_seismic_catalog(raw: &Value) -> SeismicCatalog {
    let Some(records) = raw.as_array() else {
        debug!("seismic payload is not an array");
        return SeismicCatalog::default();
    };

    let events: Vec<SeismicEvent> = records
        .iter()
        .filter_map(Value::as_object)
        .map(parse_seismic_record)
        .filter(|event| !event.is_blank())
        .collect();

    if events.len() < records.len() {
        debug!(
            dropped = records.len() - events.len(),
            kept = events.len(),
            "dropped blank seismic records"
        );
    }

    SeismicCatalog::new(events)
}

fn parse_seismic_record(record: &Map<String, Value>) -> SeismicEvent {
    SeismicEvent {
        timestamp: record.get("Fecha").and_then(parse_datetime),
        magnitude: record.get("Magnitud").and_then(coerce_f64),
        depth_km: record.get("Profundidad").and_then(coerce_f64),
        latitude: record.get("Latitud").and_then(coerce_f64),
        longitude: record.get("Longitud").and_then(coerce_f64),
        reference: record
            .get("RefGeografica")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Coerce a JSON number or numeric string to a finite `f64`.
///
/// Strings may carry a trailing unit (`"2.8 Ml"`, `"36 km"`); only the leading
/// token is parsed.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_numeric_str(s)?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

fn parse_numeric_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v);
    }
    let token = trimmed.split_whitespace().next()?;
    token.parse::<f64>().ok()
}

/// Parse the date formats seen in both APIs. Date-only values map to midnight.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
