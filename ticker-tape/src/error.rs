use thiserror::Error;

/// All errors generated in `ticker-tape`.
#[derive(Debug, Error)]
pub enum TickerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error {status} for {symbol}")]
    Status {
        symbol: String,
        status: reqwest::StatusCode,
    },

    #[error("JSON parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("chart endpoint returned {code}: {description}")]
    Chart { code: String, description: String },

    #[error("quote fetch timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("refresh worker aborted: {0}")]
    Worker(String),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TickerError {
    /// Determine if an error originates from fetching quotes, and is therefore folded into an
    /// all-absent snapshot rather than surfaced to the caller.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_provider_failure(&self) -> bool {
        match self {
            TickerError::Io(_) | TickerError::Config(_) => false,
            _ => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, TickerError>;
