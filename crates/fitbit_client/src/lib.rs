//! Minimal `FitbitClient` trait and a reqwest-based implementation for the
//! Fitbit Web API endpoints the cache loader needs.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod oauth;

/// Longest response body kept inside an error.
pub(crate) const BODY_SNIPPET_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum FitbitError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("rate limit exceeded (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("oauth error: {0}")]
    OAuth(String),
}

impl FitbitError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => FitbitError::Auth(body),
            _ => FitbitError::Api { status, body },
        }
    }
}

/// What to ask the provider for on a given day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataRequest {
    /// Daily time series, e.g. `activities/steps` over period `1d`.
    TimeSeries {
        resource: &'static str,
        period: &'static str,
    },
    /// Intraday series for a single day at the given detail level.
    Intraday {
        resource: &'static str,
        detail_level: &'static str,
    },
    /// Sleep log for the night ending on the date.
    Sleep,
}

#[async_trait]
pub trait FitbitClient: Send + Sync + 'static {
    /// `GET /1/user/-/{resource}/date/{date}/{period}.json`
    async fn time_series(
        &self,
        resource: &str,
        date: NaiveDate,
        period: &str,
    ) -> Result<serde_json::Value, FitbitError>;

    /// `GET /1/user/-/{resource}/date/{date}/1d/{detail_level}.json`
    async fn intraday_time_series(
        &self,
        resource: &str,
        date: NaiveDate,
        detail_level: &str,
    ) -> Result<serde_json::Value, FitbitError>;

    /// `GET /1/user/-/sleep/date/{date}.json`
    async fn get_sleep(&self, date: NaiveDate) -> Result<serde_json::Value, FitbitError>;

    /// Dispatch a [`DataRequest`] for one day to the matching endpoint.
    async fn fetch(
        &self,
        request: &DataRequest,
        date: NaiveDate,
    ) -> Result<serde_json::Value, FitbitError> {
        match request {
            DataRequest::TimeSeries { resource, period } => {
                self.time_series(resource, date, period).await
            }
            DataRequest::Intraday {
                resource,
                detail_level,
            } => {
                self.intraday_time_series(resource, date, detail_level)
                    .await
            }
            DataRequest::Sleep => self.get_sleep(date).await,
        }
    }
}
