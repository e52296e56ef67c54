use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::http::ApiClient;
use super::{API_DATE_FORMAT, RemoteSource};
use crate::services::ingest::error::FetchError;
use crate::services::ingest::normalizer::RawTable;
use crate::services::ingest::planner::DateRange;

/// FRED marks a missing observation with a lone dot.
const MISSING_VALUE: &str = ".";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

pub struct FredSource {
    client: Arc<ApiClient>,
    base_url: String,
    api_key: SecretString,
}

impl FredSource {
    pub fn new(client: Arc<ApiClient>, base_url: &str, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl RemoteSource for FredSource {
    fn name(&self) -> &str {
        "fred"
    }

    async fn fetch(&self, series_id: &str, range: DateRange) -> Result<RawTable, FetchError> {
        let url = format!("{}/fred/series/observations", self.base_url);
        let query = [
            ("series_id", series_id.to_string()),
            (
                "observation_start",
                range.start.format(API_DATE_FORMAT).to_string(),
            ),
            (
                "observation_end",
                range.end.format(API_DATE_FORMAT).to_string(),
            ),
            ("api_key", self.api_key.expose_secret().to_string()),
            ("file_type", "json".to_string()),
        ];

        let response: ObservationsResponse = self.client.get_json(&url, &query).await?;
        info!(
            series_id,
            %range,
            rows = response.observations.len(),
            "Fetched FRED observations"
        );

        let rows = response
            .observations
            .into_iter()
            .map(|obs| {
                let value = (obs.value.trim() != MISSING_VALUE).then_some(obs.value);
                vec![Some(obs.date), value]
            })
            .collect();

        Ok(RawTable::new(vec!["date".into(), "value".into()], rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_config::models::app_config::FetchConfig;
    use chrono::NaiveDate;
    use mockito::Matcher;

    #[tokio::test]
    async fn observations_request_and_missing_marker() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fred/series/observations")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("series_id".into(), "UNRATE".into()),
                Matcher::UrlEncoded("observation_start".into(), "2023-01-01".into()),
                Matcher::UrlEncoded("observation_end".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("api_key".into(), "key".into()),
                Matcher::UrlEncoded("file_type".into(), "json".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"observations":[
                    {"realtime_start":"2024-01-01","date":"2023-11-01","value":"3.7"},
                    {"realtime_start":"2024-01-01","date":"2023-12-01","value":"."}
                ]}"#,
            )
            .create_async()
            .await;

        let api = Arc::new(
            ApiClient::new(&FetchConfig {
                timeout_seconds: 5,
                request_delay_ms: 0,
                rate_limit_cooldown_seconds: 0,
                retry_on_rate_limit: false,
            })
            .unwrap(),
        );
        let source = FredSource::new(api, &server.url(), SecretString::from("key"));
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };

        let table = source.fetch("UNRATE", range).await.unwrap();

        mock.assert_async().await;
        assert_eq!(table.headers, vec!["date", "value"]);
        assert_eq!(table.cell(0, 1), Some("3.7"));
        assert_eq!(table.cell(1, 0), Some("2023-12-01"));
        assert_eq!(table.cell(1, 1), None);
    }
}
