//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the enumerated indicator codes and chart kinds (`IndicatorCode`, `ChartKind`)
//! - normalized indicator series (`IndicatorSeries`, `SeriesPoint`)
//! - seismic events and catalogs (`SeismicEvent`, `SeismicCatalog`)

pub mod types;

pub use types::*;
