use crate::ghcn::GhcnParseError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Station file not found (404): {0}")]
    NotFound(String),
    #[error("Server error (5xx): {0}")]
    ServerError(String),
    #[error("Unexpected response: {0}")]
    UnexpectedStatus(String),
    #[error("Failed to parse station file: {0}")]
    Parse(#[from] GhcnParseError),
}
