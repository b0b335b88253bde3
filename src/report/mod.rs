//! Reporting utilities: formatted terminal output for indicators and catalogs.

pub mod format;

pub use format::{
    fmt_money, format_catalog_summary, format_catalog_table, format_comparison,
    format_indicator_panel, format_indicator_summary, format_points_table, format_seismic_snapshot,
    format_stats_table,
};
