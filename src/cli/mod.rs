//! Command-line parsing for the Chilean indicators / seismic dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from fetching and statistics.

use std::path::PathBuf;

use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};

use crate::domain::{ChartKind, IndicatorCode};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dvc", version, about = "Indicadores económicos y sismos de Chile en la terminal")]
pub struct Cli {
    /// Log debug output to stderr (`RUST_LOG` overrides).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chart and summarize one economic indicator for a year.
    Indicator(IndicatorArgs),
    /// Filter and summarize the recent seismic catalog.
    Seismos(SeismosArgs),
    /// Overlay two indicators for the same year.
    Compare(CompareArgs),
    /// One-screen overview: UF, dólar and the latest earthquakes.
    Dashboard(DashboardArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct IndicatorArgs {
    /// Indicator code.
    #[arg(short = 'c', long, value_enum, default_value_t = IndicatorCode::Uf)]
    pub code: IndicatorCode,

    /// Four-digit year (defaults to the current year).
    #[arg(short = 'y', long)]
    pub year: Option<String>,

    /// Chart style.
    #[arg(long, value_enum, default_value_t = ChartKind::Line)]
    pub chart: ChartKind,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Number of trailing rows in the data table.
    #[arg(long, default_value_t = 10)]
    pub rows: usize,

    /// Export the series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SeismosArgs {
    /// Keep events with at least this magnitude.
    #[arg(long)]
    pub min_magnitude: Option<f64>,

    /// Keep events at most this deep (km).
    #[arg(long)]
    pub max_depth: Option<f64>,

    /// Keep only the N most recent events (clamped to the filtered count).
    #[arg(long, default_value_t = crate::stats::SEISMIC_DISPLAY_WINDOW)]
    pub last: usize,

    /// Magnitude histogram bins.
    #[arg(long, default_value_t = crate::stats::DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the filtered catalog to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct CompareArgs {
    /// First indicator (`*` in the chart).
    #[arg(short = 'a', long, value_enum)]
    pub left: IndicatorCode,

    /// Second indicator (`+` in the chart).
    #[arg(short = 'b', long, value_enum)]
    pub right: IndicatorCode,

    /// Four-digit year (defaults to the current year).
    #[arg(short = 'y', long)]
    pub year: Option<String>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Parser, Clone, Default)]
pub struct DashboardArgs {
    /// Four-digit year (defaults to the current year).
    #[arg(short = 'y', long)]
    pub year: Option<String>,
}

/// Resolve an optional `--year` flag, defaulting to the current year.
pub fn resolve_year(year: Option<&str>) -> Result<String, AppError> {
    match year {
        Some(y) => validate_year(y).map(str::to_string),
        None => Ok(Local::now().year().to_string()),
    }
}

/// Accept exactly four ASCII digits. The API itself decides whether data exists.
pub fn validate_year(year: &str) -> Result<&str, AppError> {
    let year = year.trim();
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Ok(year)
    } else {
        Err(AppError::config(format!("Año inválido '{year}': se esperan 4 dígitos")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_validation() {
        assert_eq!(validate_year("2024").unwrap(), "2024");
        assert_eq!(validate_year(" 1999 ").unwrap(), "1999");
        assert!(validate_year("24").is_err());
        assert!(validate_year("20a4").is_err());
        assert!(validate_year("20245").is_err());
        assert_eq!(validate_year("abcd").unwrap_err().exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn missing_year_defaults_to_current() {
        let year = resolve_year(None).unwrap();
        assert_eq!(year, Local::now().year().to_string());
    }

    #[test]
    fn parses_indicator_command() {
        let cli = Cli::parse_from(["dvc", "indicator", "-c", "dolar", "-y", "2023", "--chart", "bar"]);
        match cli.command {
            Command::Indicator(args) => {
                assert_eq!(args.code, IndicatorCode::Dolar);
                assert_eq!(args.year.as_deref(), Some("2023"));
                assert_eq!(args.chart, ChartKind::Bar);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_seismos_filters() {
        let cli = Cli::parse_from(["dvc", "-v", "seismos", "--min-magnitude", "4.5", "--last", "10"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Seismos(args) => {
                assert_eq!(args.min_magnitude, Some(4.5));
                assert_eq!(args.max_depth, None);
                assert_eq!(args.last, 10);
                assert_eq!(args.bins, crate::stats::DEFAULT_HISTOGRAM_BINS);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn seismos_shows_last_fifty_by_default() {
        let cli = Cli::parse_from(["dvc", "seismos"]);
        match cli.command {
            Command::Seismos(args) => assert_eq!(args.last, 50),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_indicator_code() {
        assert!(Cli::try_parse_from(["dvc", "indicator", "-c", "yen"]).is_err());
    }
}
