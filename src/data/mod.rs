//! Remote data: HTTP access (`client`) and payload normalization (`normalize`).

pub mod client;
pub mod normalize;

pub use client::{ApiClient, FetchError, JsonTransport, ReqwestTransport};
pub use normalize::{normalize_indicator, normalize_seismic_catalog};
