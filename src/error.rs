use thiserror::Error;

/// Errors returned by design service operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The service could not be reached at all.
    #[error("Could not connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The service returned a non-success HTTP status.
    #[error("Design service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A response body was not the JSON shape expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing narration to the console failed.
    #[error("Console output failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// True when the failure means the service is not running or not reachable.
    pub fn is_connect(&self) -> bool {
        matches!(self, ProbeError::Connect { .. })
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ProbeError>;
