use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling `AppSettings`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown environment '{0}' (expected local, dev or prod)")]
    UnknownEnvironment(String),

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("{0} is not set")]
    MissingDatabaseUrl(&'static str),

    #[error("sync source and destination are the same database")]
    SameSyncDatabase,
}
