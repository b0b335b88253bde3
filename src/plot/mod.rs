//! Terminal charts.

pub mod ascii;

pub use ascii::{
    render_comparison, render_histogram, render_magnitude_timeline, render_scatter, render_series_chart,
    render_sparkline,
};
