//! `dataviz-chile` library crate.
//!
//! The binary (`dvc`) is a thin wrapper around this library so that:
//!
//! - fetching, caching and statistics are testable without spawning processes
//! - the pure engines (`stats`, `filter`) stay independent of the HTTP layer
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod filter;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod stats;
