//! Shared domain types.
//!
//! Everything here is immutable once built by the normalizer. Statistics and
//! filters read these types and return new values; nothing mutates in place.

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of trailing points shown by the bar chart.
pub const BAR_CHART_WINDOW: usize = 30;

/// Economic indicators published by the indicator API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCode {
    Uf,
    Dolar,
    Euro,
    Ipc,
    Utm,
    Tpm,
    Bitcoin,
}

impl IndicatorCode {
    pub const ALL: [IndicatorCode; 7] = [
        IndicatorCode::Uf,
        IndicatorCode::Dolar,
        IndicatorCode::Euro,
        IndicatorCode::Ipc,
        IndicatorCode::Utm,
        IndicatorCode::Tpm,
        IndicatorCode::Bitcoin,
    ];

    /// Path segment used by the remote API.
    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorCode::Uf => "uf",
            IndicatorCode::Dolar => "dolar",
            IndicatorCode::Euro => "euro",
            IndicatorCode::Ipc => "ipc",
            IndicatorCode::Utm => "utm",
            IndicatorCode::Tpm => "tpm",
            IndicatorCode::Bitcoin => "bitcoin",
        }
    }

    /// Human-readable label used when the payload carries no `nombre`.
    pub fn display_name(self) -> &'static str {
        match self {
            IndicatorCode::Uf => "Unidad de Fomento (UF)",
            IndicatorCode::Dolar => "Dólar Observado",
            IndicatorCode::Euro => "Euro",
            IndicatorCode::Ipc => "Índice de Precios al Consumidor",
            IndicatorCode::Utm => "Unidad Tributaria Mensual",
            IndicatorCode::Tpm => "Tasa de Política Monetaria",
            IndicatorCode::Bitcoin => "Bitcoin",
        }
    }
}

impl std::fmt::Display for IndicatorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One `(date, value)` observation of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A cleaned, chronologically sorted indicator series.
///
/// Construction goes through the normalizer, which guarantees that `points` is
/// non-empty, sorted by date and holds only finite values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub code: IndicatorCode,
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Inclusive date span covered by the series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.date, self.points.last()?.date))
    }
}

/// A single seismic reading. Every field is optional because the source
/// payload's shape varies between deployments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeismicEvent {
    pub timestamp: Option<NaiveDateTime>,
    pub magnitude: Option<f64>,
    pub depth_km: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Free-text geographic reference, when the source provides one.
    pub reference: Option<String>,
}

impl SeismicEvent {
    /// True when none of the recognized measurement fields survived coercion.
    pub fn is_blank(&self) -> bool {
        self.timestamp.is_none()
            && self.magnitude.is_none()
            && self.depth_km.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

/// Ordered collection of seismic events, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeismicCatalog {
    pub events: Vec<SeismicEvent>,
}

impl SeismicCatalog {
    pub fn new(events: Vec<SeismicEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any event carries a magnitude (the "column" exists).
    pub fn has_magnitude(&self) -> bool {
        self.events.iter().any(|e| e.magnitude.is_some())
    }

    pub fn has_depth(&self) -> bool {
        self.events.iter().any(|e| e.depth_km.is_some())
    }

    /// Whether every event carries a timestamp.
    pub fn has_timestamps(&self) -> bool {
        !self.events.is_empty() && self.events.iter().all(|e| e.timestamp.is_some())
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.events.iter().filter_map(|e| e.magnitude).collect()
    }

    pub fn depths(&self) -> Vec<f64> {
        self.events.iter().filter_map(|e| e.depth_km).collect()
    }
}

/// Chart styles offered for a single indicator series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Area,
    Bar,
}

impl ChartKind {
    /// The slice of points this chart displays.
    ///
    /// Bars only show the trailing `BAR_CHART_WINDOW` observations.
    pub fn window(self, points: &[SeriesPoint]) -> &[SeriesPoint] {
        match self {
            ChartKind::Line | ChartKind::Area => points,
            ChartKind::Bar => {
                let start = points.len().saturating_sub(BAR_CHART_WINDOW);
                &points[start..]
            }
        }
    }

    pub fn title(self, name: &str, year: &str) -> String {
        match self {
            ChartKind::Line | ChartKind::Area => format!("Evolución de {name} - {year}"),
            ChartKind::Bar => format!("Últimos {BAR_CHART_WINDOW} registros - {name}"),
        }
    }
}
