//! Loads indicator descriptions into indicator_metadata.

use econ_pipeline::jobs::{Job, run_job};

#[tokio::main]
async fn main() {
    run_job(Job::LoadMetadata).await;
}
