//! Error types for the `dvc` front end.
//!
//! Library code returns typed errors (`FetchError`) or absent values; this type
//! is what the binary prints before exiting with `exit_code`.

use crate::data::FetchError;

/// Exit code for invalid configuration or arguments.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code when a request succeeded but yielded no usable data.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for remote API failures.
pub const EXIT_FETCH: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(EXIT_NO_DATA, message)
    }

    /// Wrap a fetch failure with the name of what was being fetched.
    pub fn fetch(what: &str, err: &FetchError) -> Self {
        Self::new(EXIT_FETCH, format!("Error al obtener datos de {what}: {err}"))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
