//! Copies the canonical tables between the hosted and the local database.

use econ_pipeline::jobs::{Job, run_job};

#[tokio::main]
async fn main() {
    run_job(Job::SyncDb).await;
}
