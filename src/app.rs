//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads settings and installs logging
//! - fetches indicators / the seismic catalog through the cached pipeline
//! - prints reports and charts
//! - writes optional exports

use clap::Parser;
use tracing::warn;

use crate::cli::{Command, CompareArgs, DashboardArgs, IndicatorArgs, SeismosArgs, resolve_year};
use crate::config::Settings;
use crate::domain::IndicatorCode;
use crate::error::AppError;
use crate::filter::CatalogFilter;

pub mod pipeline;

use pipeline::Pipeline;

/// Indicators shown on the dashboard.
const DASHBOARD_INDICATORS: [IndicatorCode; 2] = [IndicatorCode::Uf, IndicatorCode::Dolar];
/// Most recent earthquakes listed on the dashboard.
const DASHBOARD_RECENT_EVENTS: usize = crate::stats::RECENT_EVENTS_WINDOW;

const SEISMIC_SOURCE: &str = "sismos";

/// Entry point for the `dvc` binary.
pub fn run() -> Result<(), AppError> {
    // `dvc` and `dvc -y 2023` behave like `dvc dashboard ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    crate::logging::init_logging(cli.verbose);
    let settings = Settings::from_env()?;
    let pipeline = Pipeline::new(&settings)?;

    match cli.command {
        Command::Indicator(args) => handle_indicator(&pipeline, args),
        Command::Seismos(args) => handle_seismos(&pipeline, args),
        Command::Compare(args) => handle_compare(&pipeline, args),
        Command::Dashboard(args) => handle_dashboard(&pipeline, args),
    }
}

fn handle_indicator(pipeline: &Pipeline, args: IndicatorArgs) -> Result<(), AppError> {
    let year = resolve_year(args.year.as_deref())?;
    let series = load_series(pipeline, args.code, &year)?;
    let stats = pipeline
        .describe(&series)
        .ok_or_else(|| no_series(&series.name, &year))?;

    println!("{}", crate::report::format_indicator_summary(&series, &year, &stats));

    println!("{}", args.chart.title(&series.name, &year));
    println!(
        "{}",
        crate::plot::render_series_chart(&series.points, args.chart, args.width, args.height)
    );

    println!("Estadísticas descriptivas");
    println!("{}", crate::report::format_stats_table(&stats));
    println!("Últimos {} registros", args.rows.clamp(1, series.len()));
    println!("{}", crate::report::format_points_table(&series.points, args.rows));

    if let Some(path) = &args.export {
        crate::io::write_series_csv(path, &series)?;
    }
    Ok(())
}

fn handle_seismos(pipeline: &Pipeline, args: SeismosArgs) -> Result<(), AppError> {
    let catalog = pipeline
        .get_seismic_catalog()
        .map_err(|e| AppError::fetch(SEISMIC_SOURCE, &e))?;
    if catalog.is_empty() {
        return Err(AppError::no_data("No hay datos sísmicos disponibles"));
    }

    let filtered = pipeline.filter_catalog(&catalog, &seismos_filter(&args));

    println!("=== Sismos recientes ===");
    println!("Eventos en el catálogo: {}", catalog.len());
    println!(
        "{}",
        crate::report::format_catalog_summary("Sismos filtrados", &crate::stats::summarize_catalog(&filtered))
    );

    if filtered.is_empty() {
        println!("Ningún sismo cumple los filtros.");
        return Ok(());
    }
    println!("{}", crate::report::format_catalog_table(&filtered));

    if let Some(hist) = crate::stats::magnitude_histogram(&filtered, args.bins) {
        println!("Distribución de magnitudes");
        println!("{}", crate::plot::render_histogram(&hist, 40));
    }
    println!("Relación magnitud-profundidad");
    println!("{}", crate::plot::render_scatter(&filtered, args.width, args.height));
    println!("Magnitud en el tiempo");
    println!(
        "{}",
        crate::plot::render_magnitude_timeline(&filtered, args.width, args.height)
    );

    if let Some(path) = &args.export {
        crate::io::write_catalog_csv(path, &filtered)?;
    }
    Ok(())
}

fn seismos_filter(args: &SeismosArgs) -> CatalogFilter {
    CatalogFilter {
        min_magnitude: args.min_magnitude,
        max_depth_km: args.max_depth,
        last_n: Some(args.last),
    }
}

fn handle_compare(pipeline: &Pipeline, args: CompareArgs) -> Result<(), AppError> {
    if args.left == args.right {
        return Err(AppError::config("Seleccione dos indicadores distintos para comparar"));
    }
    let year = resolve_year(args.year.as_deref())?;
    let left = load_series(pipeline, args.left, &year)?;
    let right = load_series(pipeline, args.right, &year)?;

    let cmp = pipeline
        .compare(&left, &right)
        .ok_or_else(|| AppError::no_data(format!("No hay datos suficientes para comparar en {year}")))?;

    println!("{}", crate::report::format_comparison(&cmp));
    println!(
        "{}",
        crate::plot::render_comparison(&cmp, args.width, args.height)
    );
    Ok(())
}

/// Render every panel; a failing panel prints its error and the rest continue.
fn handle_dashboard(pipeline: &Pipeline, args: DashboardArgs) -> Result<(), AppError> {
    let year = resolve_year(args.year.as_deref())?;

    println!("=== Dashboard Chile - {year} ===\n");
    for code in DASHBOARD_INDICATORS {
        match pipeline.get_indicator(code, &year) {
            Ok(lookup) => match lookup.series {
                Some(series) => print!("{}", crate::report::format_indicator_panel(&series)),
                None => println!("{:<24} sin datos para {year}", lookup.display_name),
            },
            Err(err) => {
                warn!(%code, error = %err, "dashboard panel failed");
                println!("{}", AppError::fetch(code.display_name(), &err));
            }
        }
    }
    println!();

    println!("Sismos recientes");
    match pipeline.get_seismic_catalog() {
        Ok(catalog) if catalog.is_empty() => println!("Sin datos sísmicos disponibles."),
        Ok(catalog) => {
            let snapshot = crate::stats::seismic_snapshot(&catalog, crate::stats::DEFAULT_HISTOGRAM_BINS);
            println!("{}", crate::report::format_seismic_snapshot(&snapshot));
            let recent = pipeline.filter_catalog(
                &catalog,
                &CatalogFilter::default().last_n(DASHBOARD_RECENT_EVENTS),
            );
            println!("{}", crate::report::format_catalog_table(&recent));
            if let Some(hist) = &snapshot.histogram {
                println!("Distribución de magnitudes (últimos {})", crate::stats::SEISMIC_DISPLAY_WINDOW);
                print!("{}", crate::plot::render_histogram(hist, 30));
            }
        }
        Err(err) => {
            warn!(error = %err, "seismic panel failed");
            println!("{}", AppError::fetch(SEISMIC_SOURCE, &err));
        }
    }
    Ok(())
}

fn load_series(
    pipeline: &Pipeline,
    code: IndicatorCode,
    year: &str,
) -> Result<crate::domain::IndicatorSeries, AppError> {
    let lookup = pipeline
        .get_indicator(code, year)
        .map_err(|e| AppError::fetch(code.display_name(), &e))?;
    lookup
        .series
        .ok_or_else(|| no_series(&lookup.display_name, year))
}

fn no_series(name: &str, year: &str) -> AppError {
    AppError::no_data(format!("No hay datos disponibles para {name} en {year}"))
}

/// Rewrite argv so `dvc` defaults to `dvc dashboard`.
///
/// Rules:
/// - `dvc`                        -> `dvc dashboard`
/// - `dvc -y 2023`                -> `dvc dashboard -y 2023`
/// - `dvc --help/--version/-h`    -> unchanged (show top-level help/version)
/// - any argv naming a subcommand -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dashboard".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let names_subcommand = argv[1..]
        .iter()
        .any(|a| matches!(a.as_str(), "indicator" | "seismos" | "compare" | "dashboard"));
    if names_subcommand {
        return argv;
    }

    // Flags without a subcommand are dashboard flags.
    if arg1.starts_with('-') {
        argv.insert(1, "dashboard".to_string());
        return argv;
    }

    // Otherwise, leave as-is and let clap report the unknown subcommand.
    argv
}
