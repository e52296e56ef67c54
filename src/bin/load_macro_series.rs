//! Loads every CSV in the macro series directory into macro_time_series.

use econ_pipeline::jobs::{Job, run_job};

#[tokio::main]
async fn main() {
    run_job(Job::LoadMacroSeries).await;
}
