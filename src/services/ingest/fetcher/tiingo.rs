use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::http::ApiClient;
use super::{API_DATE_FORMAT, RemoteSource};
use crate::services::ingest::error::FetchError;
use crate::services::ingest::normalizer::RawTable;
use crate::services::ingest::planner::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiingoEndpoint {
    /// End-of-day equity and ETF prices.
    Daily,
    /// Daily resampled FX quotes.
    Fx,
}

pub struct TiingoSource {
    client: Arc<ApiClient>,
    base_url: String,
    token: SecretString,
    endpoint: TiingoEndpoint,
}

impl TiingoSource {
    pub fn new(
        client: Arc<ApiClient>,
        base_url: &str,
        token: SecretString,
        endpoint: TiingoEndpoint,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            endpoint,
        }
    }

    fn url(&self, symbol: &str) -> String {
        match self.endpoint {
            TiingoEndpoint::Daily => format!("{}/tiingo/daily/{}/prices", self.base_url, symbol),
            TiingoEndpoint::Fx => format!("{}/tiingo/fx/{}/prices", self.base_url, symbol),
        }
    }

    fn query(&self, range: DateRange) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("startDate", range.start.format(API_DATE_FORMAT).to_string()),
            ("endDate", range.end.format(API_DATE_FORMAT).to_string()),
        ];
        if self.endpoint == TiingoEndpoint::Fx {
            query.push(("resampleFreq", "1day".to_string()));
        }
        query.push(("token", self.token.expose_secret().to_string()));
        query
    }
}

#[async_trait]
impl RemoteSource for TiingoSource {
    fn name(&self) -> &str {
        match self.endpoint {
            TiingoEndpoint::Daily => "tiingo-daily",
            TiingoEndpoint::Fx => "tiingo-fx",
        }
    }

    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<RawTable, FetchError> {
        let records: Vec<Value> = self
            .client
            .get_json(&self.url(symbol), &self.query(range))
            .await?;

        info!(symbol, %range, rows = records.len(), source = self.name(), "Fetched prices");
        Ok(RawTable::from_json_records(&records))
    }
}
