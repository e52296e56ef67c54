//! Collects the FRED indicator catalog into macro_time_series.

use econ_pipeline::jobs::{Job, run_job};

#[tokio::main]
async fn main() {
    run_job(Job::CollectFred).await;
}
