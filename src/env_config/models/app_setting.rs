use super::{app_config::AppConfig, app_env::AppEnv};

/// Everything a job needs to know about its environment, built once at start.
#[derive(Debug)]
pub struct AppSettings {
    pub app_config: AppConfig,
    pub app_env: AppEnv,
}
