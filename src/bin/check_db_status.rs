//! Prints row counts, date ranges and OHLCV gaps.

use econ_pipeline::jobs::{Job, run_job};

#[tokio::main]
async fn main() {
    run_job(Job::CheckDbStatus).await;
}
