//! Input/output helpers.
//!
//! - CSV exports of series and catalogs (`export`)

pub mod export;

pub use export::*;
