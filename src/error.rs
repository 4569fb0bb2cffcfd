use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("selector `{selector}` did not appear within {timeout:?}")]
    SelectorNotFound { selector: String, timeout: Duration },

    #[error("no {field} found on {url}")]
    ExtractionEmpty { url: String, field: &'static str },

    #[error("image download from {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl ScrapeError {
    /// Whether another lookup attempt could change the result.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ScrapeError::ExtractionEmpty { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
