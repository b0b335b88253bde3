//! Shared fetch → normalize → cache pipeline used by every CLI command.
//!
//! Keeping this in one place means the commands only deal with presentation:
//! `Pipeline::get_*` hands back typed, cached data and the pure engines in
//! `stats` / `filter` derive everything else.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheKey, Clock, ExpiringCache, SystemClock};
use crate::config::Settings;
use crate::data::{ApiClient, FetchError, normalize_indicator, normalize_seismic_catalog};
use crate::domain::{IndicatorCode, IndicatorSeries, SeismicCatalog};
use crate::error::AppError;
use crate::filter::{CatalogFilter, filter_catalog};
use crate::stats::{DescriptiveStats, SeriesComparison, compare, describe_points};

/// Result of an indicator lookup that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorLookup {
    /// Name to show, whether or not data came back.
    pub display_name: String,
    /// `None` when the payload had no usable rows.
    pub series: Option<IndicatorSeries>,
}

type IndicatorResult = Result<Option<IndicatorSeries>, FetchError>;
type CatalogResult = Result<SeismicCatalog, FetchError>;

/// Owns the API client and one response cache per source family.
pub struct Pipeline {
    client: ApiClient,
    indicators: ExpiringCache<CacheKey, IndicatorResult>,
    catalogs: ExpiringCache<CacheKey, CatalogResult>,
    cache_ttl: Duration,
    failure_ttl: Duration,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let client = ApiClient::from_settings(settings)
            .map_err(|e| AppError::config(format!("No se pudo inicializar el cliente HTTP: {e}")))?;
        Ok(Self::with_parts(settings, client, Arc::new(SystemClock)))
    }

    pub fn with_parts(settings: &Settings, client: ApiClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            indicators: ExpiringCache::with_clock(clock.clone()),
            catalogs: ExpiringCache::with_clock(clock),
            cache_ttl: settings.cache_ttl,
            failure_ttl: settings.failure_ttl,
        }
    }

    /// Fetch (or reuse) the series for `code` in `year`.
    pub fn get_indicator(&self, code: IndicatorCode, year: &str) -> Result<IndicatorLookup, FetchError> {
        let key = CacheKey::indicator(code, year);
        let series = self.indicators.get_or_fetch_with(
            &key,
            || {
                let raw = self.client.fetch_indicator(code, year)?;
                let series = normalize_indicator(code, &raw);
                if series.is_none() {
                    debug!(%code, year, "indicator payload had no usable rows");
                }
                Ok(series)
            },
            |value| self.ttl_for(value),
        )?;

        let display_name = series
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| code.display_name().to_string());
        Ok(IndicatorLookup { display_name, series })
    }

    /// Fetch (or reuse) the seismic catalog. May be empty.
    pub fn get_seismic_catalog(&self) -> Result<SeismicCatalog, FetchError> {
        self.catalogs.get_or_fetch_with(
            &CacheKey::Seismic,
            || {
                let raw = self.client.fetch_seismic_catalog()?;
                Ok(normalize_seismic_catalog(&raw))
            },
            |value| self.ttl_for(value),
        )
    }

    pub fn describe(&self, series: &IndicatorSeries) -> Option<DescriptiveStats> {
        describe_points(&series.points)
    }

    pub fn filter_catalog(&self, catalog: &SeismicCatalog, filter: &CatalogFilter) -> SeismicCatalog {
        filter_catalog(catalog, filter)
    }

    pub fn compare(&self, left: &IndicatorSeries, right: &IndicatorSeries) -> Option<SeriesComparison> {
        compare(left, right)
    }

    /// Successes live for the cache TTL, failures for the failure TTL.
    fn ttl_for<T>(&self, value: &Result<T, FetchError>) -> Duration {
        if value.is_ok() { self.cache_ttl } else { self.failure_ttl }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use super::*;
    use crate::cache::ManualClock;
    use crate::data::JsonTransport;

    /// Replays scripted responses in order and records requested URLs.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<Value, FetchError>>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn push(&self, response: Result<Value, FetchError>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn calls(&self) -> usize {
            self.urls.lock().unwrap().len()
        }
    }

    impl JsonTransport for ScriptedTransport {
        fn get_json(&self, url: &str, _timeout: Duration) -> Result<Value, FetchError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::NetworkUnreachable("no scripted response".to_string())))
        }
    }

    fn settings() -> Settings {
        Settings {
            indicator_base_url: "https://indicators.test/api".to_string(),
            seismic_base_url: "https://quakes.test/sismos".to_string(),
            cache_ttl: Duration::from_secs(3600),
            failure_ttl: Duration::from_secs(3600),
            ..Settings::default()
        }
    }

    fn pipeline_with(settings: &Settings) -> (Pipeline, Arc<ScriptedTransport>, Arc<ManualClock>) {
        let transport = Arc::new(ScriptedTransport::default());
        let clock = Arc::new(ManualClock::new());
        let client = ApiClient::with_transport(settings, Box::new(transport.clone()));
        let pipeline = Pipeline::with_parts(settings, client, clock.clone());
        (pipeline, transport, clock)
    }

    fn uf_payload() -> Value {
        json!({
            "nombre": "Unidad de Fomento",
            "serie": [
                {"fecha": "2024-01-02", "valor": "36010"},
                {"fecha": "2024-01-01", "valor": "36000"}
            ]
        })
    }

    #[test]
    fn uf_end_to_end() {
        let (pipeline, transport, _clock) = pipeline_with(&settings());
        transport.push(Ok(uf_payload()));

        let lookup = pipeline.get_indicator(IndicatorCode::Uf, "2024").unwrap();
        assert_eq!(lookup.display_name, "Unidad de Fomento");
        let series = lookup.series.unwrap();
        assert_eq!(series.len(), 2);
        assert!(series.points[0].date < series.points[1].date);

        let stats = pipeline.describe(&series).unwrap();
        assert!((stats.mean - 36005.0).abs() < 1e-9);

        let change = crate::stats::percent_change(&series.points).unwrap();
        assert!((change - 0.027_777_777).abs() < 1e-6);

        assert_eq!(transport.urls.lock().unwrap()[0], "https://indicators.test/api/uf/2024");
    }

    #[test]
    fn second_lookup_within_ttl_is_served_from_cache() {
        let (pipeline, transport, clock) = pipeline_with(&settings());
        transport.push(Ok(uf_payload()));
        transport.push(Ok(json!({"serie": [{"fecha": "2024-02-01", "valor": 1}]})));

        let first = pipeline.get_indicator(IndicatorCode::Uf, "2024").unwrap();
        clock.advance(Duration::from_secs(3599));
        let second = pipeline.get_indicator(IndicatorCode::Uf, "2024").unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);

        clock.advance(Duration::from_secs(1));
        let third = pipeline.get_indicator(IndicatorCode::Uf, "2024").unwrap();
        assert_ne!(first, third);
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn failed_fetch_is_remembered_for_failure_ttl() {
        let mut settings = settings();
        settings.failure_ttl = Duration::from_secs(60);
        let (pipeline, transport, clock) = pipeline_with(&settings);
        transport.push(Err(FetchError::Timeout));
        transport.push(Ok(uf_payload()));

        assert_eq!(pipeline.get_indicator(IndicatorCode::Uf, "2024"), Err(FetchError::Timeout));
        assert_eq!(pipeline.get_indicator(IndicatorCode::Uf, "2024"), Err(FetchError::Timeout));
        assert_eq!(transport.calls(), 1);

        clock.advance(Duration::from_secs(60));
        assert!(pipeline.get_indicator(IndicatorCode::Uf, "2024").is_ok());
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn empty_serie_is_absent_with_fallback_name() {
        let (pipeline, transport, _clock) = pipeline_with(&settings());
        transport.push(Ok(json!({"serie": []})));

        let lookup = pipeline.get_indicator(IndicatorCode::Bitcoin, "2021").unwrap();
        assert!(lookup.series.is_none());
        assert_eq!(lookup.display_name, "Bitcoin");
    }

    #[test]
    fn seismic_catalog_is_cached_and_filterable() {
        let (pipeline, transport, _clock) = pipeline_with(&settings());
        transport.push(Ok(json!([
            {"Fecha": "2024-06-01 01:00:00", "Magnitud": "3.0", "Profundidad": "10"},
            {"Fecha": "2024-06-01 02:00:00", "Magnitud": "5.0", "Profundidad": "80"},
            {"Fecha": "2024-06-01 03:00:00", "Magnitud": "6.2", "Profundidad": "30"}
        ])));

        let catalog = pipeline.get_seismic_catalog().unwrap();
        let again = pipeline.get_seismic_catalog().unwrap();
        assert_eq!(catalog, again);
        assert_eq!(transport.calls(), 1);

        let strong = pipeline.filter_catalog(&catalog, &CatalogFilter::default().min_magnitude(5.0));
        assert_eq!(strong.magnitudes(), vec![5.0, 6.2]);
    }

    #[test]
    fn default_settings_build_a_live_pipeline() {
        assert!(Pipeline::new(&Settings::default()).is_ok());
    }

    #[test]
    fn indicator_and_seismic_keys_do_not_collide() {
        let (pipeline, transport, _clock) = pipeline_with(&settings());
        transport.push(Ok(uf_payload()));
        transport.push(Ok(json!([{"Magnitud": 4.0}])));

        assert!(pipeline.get_indicator(IndicatorCode::Uf, "2024").unwrap().series.is_some());
        assert_eq!(pipeline.get_seismic_catalog().unwrap().len(), 1);
        assert_eq!(transport.calls(), 2);
    }
}
