use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::env_config::models::app_config::FetchConfig;
use crate::services::ingest::error::FetchError;

/// Longest response body kept in an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// Thin wrapper over `reqwest` that applies the request timeout and the
/// single cooldown-and-retry on HTTP 429.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    rate_limit_cooldown: Duration,
    retry_on_rate_limit: bool,
}

impl ApiClient {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            rate_limit_cooldown: Duration::from_secs(config.rate_limit_cooldown_seconds),
            retry_on_rate_limit: config.retry_on_rate_limit,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    /// GETs `url` and decodes the JSON body. Query values may hold secrets;
    /// they never reach logs or error messages.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let mut response = self.send(url, query).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            if !self.retry_on_rate_limit {
                return Err(FetchError::RateLimited);
            }
            warn!(
                url,
                cooldown_secs = self.rate_limit_cooldown.as_secs(),
                "Rate limited, cooling down before retry"
            );
            tokio::time::sleep(self.rate_limit_cooldown).await;

            response = self.send(url, query).await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                return Err(FetchError::RateLimited);
            }
        }

        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url())?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        debug!(url, status = status.as_u16(), bytes = body.len(), "Received response");
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Response, FetchError> {
        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn client() -> ApiClient {
        ApiClient::new(&FetchConfig {
            timeout_seconds: 5,
            request_delay_ms: 0,
            rate_limit_cooldown_seconds: 0,
            retry_on_rate_limit: true,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn retries_once_after_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/data")
            .with_status(429)
            .expect(2)
            .create_async()
            .await;

        let url = format!("{}/data", server.url());
        let api = client().with_cooldown(Duration::from_millis(10));

        let result: Result<Value, _> = api.get_json(&url, &[]).await;
        assert!(matches!(result, Err(FetchError::RateLimited)));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_without_retry_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/data")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/data", server.url());
        let mut api = client();
        api.retry_on_rate_limit = false;

        let result: Result<Value, _> = api.get_json(&url, &[]).await;
        assert!(matches!(result, Err(FetchError::RateLimited)));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let url = format!("{}/data", server.url());
        let result: Result<Value, _> = client().get_json(&url, &[]).await;

        mock.assert_async().await;
        match result {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/data")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let url = format!("{}/data", server.url());
        let result: Result<Value, _> = client().get_json(&url, &[]).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }
}
