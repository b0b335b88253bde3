//! HTTP access to the indicator and seismic APIs.
//!
//! Each call is a single timed GET; there are no retries. Failures come back as
//! a typed `FetchError` so callers can tell "the API failed" apart from "the
//! API answered with nothing useful".

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;
use crate::domain::IndicatorCode;

const USER_AGENT: &str = concat!("dataviz-chile/", env!("CARGO_PKG_VERSION"));

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("server responded with HTTP status {0}")]
    HttpStatus(u16),
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("invalid JSON payload: {0}")]
    Decode(String),
}

/// Blocking GET-and-decode seam. Production uses reqwest; tests script responses.
pub trait JsonTransport: Send + Sync {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError>;
}

impl<T: JsonTransport + ?Sized> JsonTransport for Arc<T> {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        (**self).get_json(url, timeout)
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

impl JsonTransport for ReqwestTransport {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(classify_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        resp.json::<Value>().map_err(classify_reqwest_error)
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::NetworkUnreachable(err.to_string())
    }
}

/// Client for both endpoint families.
pub struct ApiClient {
    transport: Box<dyn JsonTransport>,
    indicator_base_url: String,
    seismic_base_url: String,
    indicator_timeout: Duration,
    seismic_timeout: Duration,
}

impl ApiClient {
    pub fn from_settings(settings: &Settings) -> reqwest::Result<Self> {
        Ok(Self::with_transport(settings, Box::new(ReqwestTransport::new()?)))
    }

    pub fn with_transport(settings: &Settings, transport: Box<dyn JsonTransport>) -> Self {
        Self {
            transport,
            indicator_base_url: settings.indicator_base_url.clone(),
            seismic_base_url: settings.seismic_base_url.clone(),
            indicator_timeout: settings.indicator_timeout,
            seismic_timeout: settings.seismic_timeout,
        }
    }

    /// `GET {base}/{code}/{year}`.
    pub fn fetch_indicator(&self, code: IndicatorCode, year: &str) -> Result<Value, FetchError> {
        let url = indicator_url(&self.indicator_base_url, code, year);
        info!(%code, year, %url, "fetching indicator");
        self.transport
            .get_json(&url, self.indicator_timeout)
            .inspect_err(|e| warn!(%code, year, error = %e, "indicator fetch failed"))
    }

    /// `GET {base}`.
    pub fn fetch_seismic_catalog(&self) -> Result<Value, FetchError> {
        let url = self.seismic_base_url.trim_end_matches('/');
        info!(%url, "fetching seismic catalog");
        self.transport
            .get_json(url, self.seismic_timeout)
            .inspect_err(|e| warn!(error = %e, "seismic fetch failed"))
    }
}

pub fn indicator_url(base: &str, code: IndicatorCode, year: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), code.as_str(), year)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Mutex;
    use std::thread;

    use serde_json::json;

    use super::*;

    struct RecordingTransport {
        calls: Mutex<Vec<(String, Duration)>>,
        response: Result<Value, FetchError>,
    }

    impl JsonTransport for RecordingTransport {
        fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
            self.calls.lock().unwrap().push((url.to_string(), timeout));
            self.response.clone()
        }
    }

    fn settings() -> Settings {
        Settings {
            indicator_base_url: "https://example.test/api/".to_string(),
            seismic_base_url: "https://example.test/sismos".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn indicator_url_joins_without_double_slash() {
        assert_eq!(
            indicator_url("https://mindicador.cl/api/", IndicatorCode::Uf, "2024"),
            "https://mindicador.cl/api/uf/2024"
        );
    }

    #[test]
    fn indicator_fetch_uses_ten_second_timeout() {
        let transport = Arc::new(RecordingTransport {
            calls: Mutex::new(Vec::new()),
            response: Ok(json!({"serie": []})),
        });
        let client = ApiClient::with_transport(&settings(), Box::new(transport.clone()));

        let body = client.fetch_indicator(IndicatorCode::Dolar, "2023").unwrap();
        assert_eq!(body, json!({"serie": []}));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://example.test/api/dolar/2023");
        assert_eq!(calls[0].1, Duration::from_secs(10));
    }

    #[test]
    fn seismic_fetch_uses_fifteen_second_timeout_and_passes_errors_through() {
        let transport = Arc::new(RecordingTransport {
            calls: Mutex::new(Vec::new()),
            response: Err(FetchError::HttpStatus(502)),
        });
        let client = ApiClient::with_transport(&settings(), Box::new(transport.clone()));

        let err = client.fetch_seismic_catalog().unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(502));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].0, "https://example.test/sismos");
        assert_eq!(calls[0].1, Duration::from_secs(15));
    }

    #[test]
    fn fetch_errors_have_readable_messages() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(
            FetchError::HttpStatus(404).to_string(),
            "server responded with HTTP status 404"
        );
    }

    /// Serve one canned HTTP response on a loopback port, after `delay`.
    fn serve_once(response: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 2048];
                let _ = stream.read(&mut request);
                thread::sleep(delay);
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        format!("http://{addr}/api/uf/2024")
    }

    #[test]
    fn reqwest_transport_decodes_json_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 13\r\nConnection: close\r\n\r\n{\"serie\": []}",
            Duration::ZERO,
        );
        let transport = ReqwestTransport::new().unwrap();
        let body = transport.get_json(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(body, json!({"serie": []}));
    }

    #[test]
    fn reqwest_transport_maps_non_success_status() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            Duration::ZERO,
        );
        let transport = ReqwestTransport::new().unwrap();
        let err = transport.get_json(&url, Duration::from_secs(5)).unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(503));
    }

    #[test]
    fn reqwest_transport_maps_malformed_json_to_decode() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 5\r\nConnection: close\r\n\r\n{oops",
            Duration::ZERO,
        );
        let transport = ReqwestTransport::new().unwrap();
        let err = transport.get_json(&url, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn reqwest_transport_maps_slow_server_to_timeout() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
            Duration::from_millis(1500),
        );
        let transport = ReqwestTransport::new().unwrap();
        let err = transport.get_json(&url, Duration::from_millis(300)).unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[test]
    fn reqwest_transport_maps_refused_connection_to_unreachable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .get_json(&format!("http://127.0.0.1:{port}/sismos"), Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, FetchError::NetworkUnreachable(_)), "got {err:?}");
    }
}
