//! HTTP client implementation for the Fitbit Web API.
//!
//! This module provides a reqwest-based implementation of the [`FitbitClient`](crate::FitbitClient) trait.

use crate::config::Credentials;
use crate::{BODY_SNIPPET_LEN, FitbitClient, FitbitError};
use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Client for the Fitbit Web API using reqwest and a bearer access token.
#[derive(Clone, Debug)]
pub struct ReqwestFitbitClient {
    base_url: String,
    access_token: SecretString,
    client: reqwest::Client,
}

impl ReqwestFitbitClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Fitbit API (e.g., "https://api.fitbit.com")
    /// * `access_token` - OAuth2 access token issued to the personal app
    pub fn new(base_url: &str, access_token: SecretString) -> Result<Self, FitbitError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            client,
        })
    }

    pub fn from_credentials(creds: &Credentials) -> Result<Self, FitbitError> {
        Self::new(&creds.app.api_base_url, creds.access_token.clone())
    }

    /// Build an authenticated GET request.
    fn get_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
    }

    fn user_url(&self, path: &str) -> String {
        format!("{}/1/user/-/{}", self.base_url, path)
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, FitbitError> {
        let resp = request.send().await?;
        log_rate_limit(&resp);
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.json().await?)
    }
}

fn header_u64(resp: &reqwest::Response, name: &str) -> Option<u64> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// The provider reports its hourly quota on every response.
fn log_rate_limit(resp: &reqwest::Response) {
    let remaining = header_u64(resp, "fitbit-rate-limit-remaining");
    let reset = header_u64(resp, "fitbit-rate-limit-reset");
    if remaining.is_some() || reset.is_some() {
        tracing::debug!(?remaining, reset_secs = ?reset, "fitbit rate limit");
    }
}

/// Extract error information from a failed response.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> FitbitError {
    let status = resp.status().as_u16();
    if status == 429 {
        let retry_after = header_u64(&resp, "retry-after");
        return FitbitError::RateLimited { retry_after };
    }
    let body = resp.text().await.unwrap_or_default();
    let body_snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
    FitbitError::from_status(status, body_snippet)
}

#[async_trait]
impl FitbitClient for ReqwestFitbitClient {
    async fn time_series(
        &self,
        resource: &str,
        date: NaiveDate,
        period: &str,
    ) -> Result<serde_json::Value, FitbitError> {
        let url = self.user_url(&format!(
            "{}/date/{}/{}.json",
            resource,
            date.format(DATE_FORMAT),
            period
        ));
        tracing::debug!(%url, "fetching time series");
        self.execute_json(self.get_request(&url)).await
    }

    async fn intraday_time_series(
        &self,
        resource: &str,
        date: NaiveDate,
        detail_level: &str,
    ) -> Result<serde_json::Value, FitbitError> {
        let url = self.user_url(&format!(
            "{}/date/{}/1d/{}.json",
            resource,
            date.format(DATE_FORMAT),
            detail_level
        ));
        tracing::debug!(%url, "fetching intraday time series");
        self.execute_json(self.get_request(&url)).await
    }

    async fn get_sleep(&self, date: NaiveDate) -> Result<serde_json::Value, FitbitError> {
        let url = self.user_url(&format!("sleep/date/{}.json", date.format(DATE_FORMAT)));
        tracing::debug!(%url, "fetching sleep log");
        self.execute_json(self.get_request(&url)).await
    }
}
