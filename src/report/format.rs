//! Formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline and the statistics
//! stay free of presentation concerns. Absent values print as `-`, never `0`.

use chrono::NaiveDateTime;

use crate::domain::{IndicatorSeries, SeismicCatalog, SeismicEvent, SeriesPoint};
use crate::domain::BAR_CHART_WINDOW;
use crate::filter::last_points;
use crate::plot::render_sparkline;
use crate::stats::{
    CatalogSummary, DescriptiveStats, RECENT_EVENTS_WINDOW, RECENT_MAGNITUDE_WINDOW, SeismicSnapshot,
    SeriesComparison, latest_delta, percent_change,
};

const MISSING: &str = "-";

/// Headline block for one indicator: latest value, mean, extremes, trend.
pub fn format_indicator_summary(series: &IndicatorSeries, year: &str, stats: &DescriptiveStats) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} - {year} ===\n", series.name));
    out.push_str(&format!("Datos obtenidos: {} registros\n", series.len()));
    if let Some((start, end)) = series.date_range() {
        out.push_str(&format!("Período: {start} .. {end}\n"));
    }
    out.push('\n');

    let latest = series.latest().map(|p| p.value);
    out.push_str(&format!("{:<24} {:>16}\n", "Valor actual", fmt_money_opt(latest)));
    out.push_str(&format!("{:<24} {:>16}\n", "Promedio", fmt_money(stats.mean)));
    out.push_str(&format!("{:<24} {:>16}\n", "Máximo", fmt_money(stats.max)));
    out.push_str(&format!("{:<24} {:>16}\n", "Mínimo", fmt_money(stats.min)));

    let change = percent_change(&series.points)
        .map(|v| format!("{v:.2}%"))
        .unwrap_or_else(|| MISSING.to_string());
    out.push_str(&format!("{:<24} {:>16}\n", "Variación del período", change));

    let delta = latest_delta(&series.points)
        .map(|v| format!("{v:+.2}"))
        .unwrap_or_else(|| MISSING.to_string());
    out.push_str(&format!("{:<24} {:>16}\n", "Último cambio", delta));

    let std = if stats.std.is_finite() {
        fmt_money(stats.std)
    } else {
        MISSING.to_string()
    };
    out.push_str(&format!("{:<24} {:>16}\n", "Desviación estándar", std));

    out
}

/// Compact dashboard line: latest value, last change and a trailing sparkline.
pub fn format_indicator_panel(series: &IndicatorSeries) -> String {
    let latest = fmt_money_opt(series.latest().map(|p| p.value));
    let delta = latest_delta(&series.points)
        .map(|v| format!("{v:+.2}"))
        .unwrap_or_else(|| MISSING.to_string());
    let spark = render_sparkline(last_points(&series.points, BAR_CHART_WINDOW));
    format!("{:<24} {latest:>14} {delta:>10}  {spark}\n", series.name)
}

/// Side-by-side statistics for two indicators.
pub fn format_comparison(cmp: &SeriesComparison) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} vs {} ===\n", cmp.left.name, cmp.right.name));
    out.push_str(&format!("Período: {} .. {}\n\n", cmp.date_range.0, cmp.date_range.1));
    out.push_str(&format!("{:<12} {:>18} {:>18}\n", "", cmp.left.code, cmp.right.code));

    out.push_str(&format!(
        "{:<12} {:>18} {:>18}\n",
        "registros", cmp.left.stats.count, cmp.right.stats.count
    ));
    let rows = [
        ("promedio", cmp.left.stats.mean, cmp.right.stats.mean),
        ("mínimo", cmp.left.stats.min, cmp.right.stats.min),
        ("máximo", cmp.left.stats.max, cmp.right.stats.max),
    ];
    for (label, left, right) in rows {
        out.push_str(&format!("{label:<12} {:>18} {:>18}\n", fmt_money(left), fmt_money(right)));
    }

    let change = |points: &[SeriesPoint]| {
        percent_change(points)
            .map(|v| format!("{v:.2}%"))
            .unwrap_or_else(|| MISSING.to_string())
    };
    out.push_str(&format!(
        "{:<12} {:>18} {:>18}\n",
        "variación",
        change(&cmp.left.points),
        change(&cmp.right.points)
    ));
    out
}

/// `describe()`-style table: count, mean, std, min, quartiles, max.
pub fn format_stats_table(stats: &DescriptiveStats) -> String {
    let rows = [
        ("count", stats.count as f64),
        ("mean", stats.mean),
        ("std", stats.std),
        ("min", stats.min),
        ("25%", stats.p25),
        ("50%", stats.p50),
        ("75%", stats.p75),
        ("max", stats.max),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let value = if value.is_finite() {
            format!("{value:.4}")
        } else {
            "NaN".to_string()
        };
        out.push_str(&format!("{label:<6} {value:>18}\n"));
    }
    out
}

/// Trailing `rows` points as a two-column table.
pub fn format_points_table(points: &[SeriesPoint], rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:>16}\n", "fecha", "valor"));
    out.push_str(&format!("{:-<12} {:-<16}\n", "", ""));
    for p in last_points(points, rows) {
        out.push_str(&format!("{:<12} {:>16.2}\n", p.date.to_string(), p.value));
    }
    out
}

/// Headline block for a seismic catalog; `label` names the event count.
pub fn format_catalog_summary(label: &str, summary: &CatalogSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{label:<24} {:>10}\n", summary.count));
    out.push_str(&format!(
        "{:<24} {:>10}\n",
        "Magnitud promedio",
        fmt_opt(summary.mean_magnitude, 1, "")
    ));
    out.push_str(&format!(
        "{:<24} {:>10}\n",
        "Magnitud máxima",
        fmt_opt(summary.max_magnitude, 1, "")
    ));
    out.push_str(&format!(
        "{:<24} {:>10}\n",
        "Profundidad promedio",
        fmt_opt(summary.mean_depth_km, 0, " km")
    ));
    out
}

/// Dashboard block: catalog size, recent activity and recent mean magnitude.
pub fn format_seismic_snapshot(snapshot: &SeismicSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<32} {:>8}\n", "Sismos registrados", snapshot.total));
    out.push_str(&format!(
        "{:<32} {:>8}\n",
        format!("Sismos recientes (últimos {RECENT_EVENTS_WINDOW})"),
        snapshot.recent_count
    ));
    out.push_str(&format!(
        "{:<32} {:>8}\n",
        format!("Magnitud promedio (últimos {RECENT_MAGNITUDE_WINDOW})"),
        fmt_opt(snapshot.recent_mean_magnitude, 1, "")
    ));
    out
}

/// Event table in catalog order.
pub fn format_catalog_table(catalog: &SeismicCatalog) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<19} {:>8} {:>11} {:>9} {:>9} {}\n",
            "fecha", "magnitud", "profundidad", "latitud", "longitud", "referencia"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<19} {:-<8} {:-<11} {:-<9} {:-<9} {:-<10}\n", "", "", "", "", "", ""));
    for event in &catalog.events {
        out.push_str(format_event_row(event).trim_end());
        out.push('\n');
    }
    out
}

fn format_event_row(event: &SeismicEvent) -> String {
    format!(
        "{:<19} {:>8} {:>11} {:>9} {:>9} {}\n",
        fmt_timestamp(event.timestamp),
        fmt_opt(event.magnitude, 1, ""),
        fmt_opt(event.depth_km, 0, ""),
        fmt_opt(event.latitude, 3, ""),
        fmt_opt(event.longitude, 3, ""),
        event.reference.as_deref().unwrap_or(""),
    )
}

fn fmt_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn fmt_opt(value: Option<f64>, decimals: usize, suffix: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}{suffix}"),
        _ => MISSING.to_string(),
    }
}

fn fmt_money_opt(value: Option<f64>) -> String {
    value.map(fmt_money).unwrap_or_else(|| MISSING.to_string())
}

/// `$36,010.25`-style formatting with thousands separators.
pub fn fmt_money(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}
