//! Export fetched data to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Absent seismic fields are written as empty cells.

use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::domain::{IndicatorSeries, SeismicCatalog};
use crate::error::AppError;

/// Write an indicator series (`codigo,fecha,valor`) to a CSV file.
pub fn write_series_csv(path: &Path, series: &IndicatorSeries) -> Result<(), AppError> {
    let mut writer = create(path)?;
    write_series(&mut writer, series).map_err(|e| write_error(path, e))
}

/// Write a seismic catalog to a CSV file.
pub fn write_catalog_csv(path: &Path, catalog: &SeismicCatalog) -> Result<(), AppError> {
    let mut writer = create(path)?;
    write_catalog(&mut writer, catalog).map_err(|e| write_error(path, e))
}

fn write_series<W: Write>(writer: &mut Writer<W>, series: &IndicatorSeries) -> csv::Result<()> {
    writer.write_record(["codigo", "fecha", "valor"])?;
    for p in &series.points {
        writer.write_record([series.code.to_string(), p.date.to_string(), p.value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_catalog<W: Write>(writer: &mut Writer<W>, catalog: &SeismicCatalog) -> csv::Result<()> {
    writer.write_record(["fecha", "magnitud", "profundidad_km", "latitud", "longitud", "referencia"])?;
    for e in &catalog.events {
        let timestamp = e
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        writer.write_record([
            timestamp,
            cell(e.magnitude),
            cell(e.depth_km),
            cell(e.latitude),
            cell(e.longitude),
            e.reference.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn create(path: &Path) -> Result<Writer<std::fs::File>, AppError> {
    Writer::from_path(path)
        .map_err(|e| AppError::config(format!("No se pudo crear '{}': {e}", path.display())))
}

fn write_error(path: &Path, err: csv::Error) -> AppError {
    AppError::config(format!("No se pudo escribir '{}': {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{IndicatorCode, SeismicEvent, SeriesPoint};

    fn written<F>(write: F) -> String
    where
        F: FnOnce(&mut Writer<Vec<u8>>) -> csv::Result<()>,
    {
        let mut writer = Writer::from_writer(Vec::new());
        write(&mut writer).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    fn catalog_with_reference(reference: &str) -> SeismicCatalog {
        SeismicCatalog::new(vec![SeismicEvent {
            magnitude: Some(3.4),
            reference: Some(reference.to_string()),
            ..Default::default()
        }])
    }

    #[test]
    fn series_rows_follow_header() {
        let series = IndicatorSeries {
            code: IndicatorCode::Dolar,
            name: "Dólar observado".to_string(),
            points: vec![SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                value: 950.5,
            }],
        };
        let text = written(|w| write_series(w, &series));
        assert_eq!(text, "codigo,fecha,valor\ndolar,2024-03-01,950.5\n");
    }

    #[test]
    fn catalog_leaves_absent_fields_empty_and_quotes_references() {
        let text = written(|w| write_catalog(w, &catalog_with_reference("25 km al S de Ovalle, Coquimbo")));
        assert_eq!(
            text.lines().nth(1).unwrap(),
            ",3.4,,,,\"25 km al S de Ovalle, Coquimbo\""
        );
    }

    #[test]
    fn carriage_returns_in_references_stay_inside_one_record() {
        let text = written(|w| write_catalog(w, &catalog_with_reference("25 km al S\rde Ovalle")));
        assert!(text.ends_with(",3.4,,,,\"25 km al S\rde Ovalle\"\n"));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][5], "25 km al S\rde Ovalle");
    }

    #[test]
    fn unwritable_path_is_a_config_error() {
        let series = IndicatorSeries {
            code: IndicatorCode::Uf,
            name: "UF".to_string(),
            points: Vec::new(),
        };
        let err = write_series_csv(Path::new("/nonexistent-dir/out.csv"), &series).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }
}
