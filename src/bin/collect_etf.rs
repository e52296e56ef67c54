//! Collects ETF daily prices from Tiingo into market_price_daily.

use econ_pipeline::jobs::{Job, run_job};

#[tokio::main]
async fn main() {
    run_job(Job::CollectEtf).await;
}
