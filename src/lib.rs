//! Incremental collection of market prices, FX rates and macro indicators
//! into PostgreSQL, plus a read-only status surface for dashboards.

pub mod api;
pub mod app_state;
pub mod db;
pub mod env_config;
pub mod jobs;
pub mod layers;
pub mod logger;
pub mod server;
pub mod services;
