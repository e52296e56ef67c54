use secrecy::SecretString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::env_config::error::ConfigError;

/// Connection string used when neither `DATABASE_URL` nor `SUPABASE_DB_URI` is set.
pub const LOCAL_DATABASE_URL: &str = "postgres://postgres@localhost:5432/economy_db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Local,
    Dev,
    Prod,
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Env::Local => write!(f, "local"),
            Env::Dev => write!(f, "dev"),
            Env::Prod => write!(f, "prod"),
        }
    }
}

impl FromStr for Env {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "prod" | "production" => Ok(Env::Prod),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Values sourced from the process environment (and `.env`).
#[derive(Debug)]
pub struct AppEnv {
    pub env: Env,
    /// Database every job writes to.
    pub database_url: String,
    /// `SUPABASE_DB_URI`, the hosted copy.
    pub cloud_database_url: Option<String>,
    /// `LOCAL_DATABASE_URL`, or the built-in local fallback.
    pub local_database_url: String,
    pub tiingo_api_key: Option<SecretString>,
    pub fred_api_key: Option<SecretString>,
    pub config_dir: PathBuf,
}

impl AppEnv {
    pub fn is_local(&self) -> bool {
        self.env == Env::Local
    }
}
