//! Range-bounded HTTP sources.

pub mod fred;
pub mod http;
pub mod tiingo;

use async_trait::async_trait;

use crate::services::ingest::error::FetchError;
use crate::services::ingest::normalizer::RawTable;
use crate::services::ingest::planner::DateRange;

/// A remote API that can return the observations of one series for a date
/// window. An empty table means the source had nothing in that window.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<RawTable, FetchError>;
}

pub(crate) const API_DATE_FORMAT: &str = "%Y-%m-%d";
