use thiserror::Error;

use crate::env_config::error::ConfigError;
use crate::services::loaders::LoadError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited after retry")]
    RateLimited,

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no value column recognized for {symbol} (columns: {columns:?})")]
    NoValueColumn { symbol: String, columns: Vec<String> },
}

/// Failures that abort a whole job rather than a single symbol.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("logger initialization failed: {0}")]
    Logger(#[from] std::io::Error),
}
