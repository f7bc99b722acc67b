//! Shared test doubles: a recording `FitbitClient` and an in-memory `RecordStore`
//! with the same unique-date semantics as the MongoDB indexes.
#![cfg(test)]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use fitbit_client::{DataRequest, FitbitClient, FitbitError};
use serde_json::json;
use tokio::sync::Mutex;

use crate::catalog::Dataset;
use crate::dates::date_key;
use crate::error::LoadResult;
use crate::store::{InsertOutcome, RecordStore};

/// Answers every request with a provider-shaped payload for the day and
/// records what was asked.
#[derive(Default)]
pub struct MockClient {
    calls: Mutex<Vec<(DataRequest, NaiveDate)>>,
    fail_on: Option<NaiveDate>,
    dateless: bool,
}

impl MockClient {
    pub fn failing_on(date: NaiveDate) -> Self {
        Self {
            fail_on: Some(date),
            ..Default::default()
        }
    }

    /// Responses with an empty entry list, like a night without a sleep log.
    pub fn dateless() -> Self {
        Self {
            dateless: true,
            ..Default::default()
        }
    }

    pub async fn calls(&self) -> Vec<(DataRequest, NaiveDate)> {
        self.calls.lock().await.clone()
    }

    fn payload(&self, request: &DataRequest, date: NaiveDate) -> serde_json::Value {
        let day = date_key(date);
        let (key, entry) = match request {
            DataRequest::TimeSeries { resource, .. } | DataRequest::Intraday { resource, .. } => (
                resource.replace('/', "-"),
                json!({"dateTime": day, "value": "42"}),
            ),
            DataRequest::Sleep => ("sleep".to_string(), json!({"dateOfSleep": day})),
        };
        let entries = if self.dateless { json!([]) } else { json!([entry]) };
        let mut body = serde_json::Map::new();
        body.insert(key, entries);
        serde_json::Value::Object(body)
    }
}

#[async_trait]
impl FitbitClient for MockClient {
    async fn time_series(
        &self,
        _resource: &str,
        _date: NaiveDate,
        _period: &str,
    ) -> Result<serde_json::Value, FitbitError> {
        unimplemented!()
    }

    async fn intraday_time_series(
        &self,
        _resource: &str,
        _date: NaiveDate,
        _detail_level: &str,
    ) -> Result<serde_json::Value, FitbitError> {
        unimplemented!()
    }

    async fn get_sleep(&self, _date: NaiveDate) -> Result<serde_json::Value, FitbitError> {
        unimplemented!()
    }

    async fn fetch(
        &self,
        request: &DataRequest,
        date: NaiveDate,
    ) -> Result<serde_json::Value, FitbitError> {
        self.calls.lock().await.push((request.clone(), date));
        if self.fail_on == Some(date) {
            return Err(FitbitError::Auth("expired_token".into()));
        }
        Ok(self.payload(request, date))
    }
}

/// Records keyed by the requested day, unique per collection like the
/// MongoDB date index.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<&'static str, Vec<(NaiveDate, serde_json::Value)>>>,
    prepared: Mutex<Vec<&'static str>>,
    forced: Mutex<HashMap<(&'static str, NaiveDate), u64>>,
    collisions: Mutex<Vec<(&'static str, NaiveDate)>>,
}

impl MemoryStore {
    pub async fn len(&self, collection: &str) -> usize {
        self.docs.lock().await.get(collection).map_or(0, Vec::len)
    }

    pub async fn snapshot(&self, collection: &str) -> Vec<(NaiveDate, serde_json::Value)> {
        self.docs
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn prepared(&self) -> Vec<&'static str> {
        self.prepared.lock().await.clone()
    }

    /// Pretend the collection holds `count` records for `date`.
    pub async fn force_count(&self, collection: &'static str, date: NaiveDate, count: u64) {
        self.forced.lock().await.insert((collection, date), count);
    }

    /// Report a unique index violation when `date` is inserted, as if another
    /// writer got there after the lookup.
    pub async fn collide_on(&self, collection: &'static str, date: NaiveDate) {
        self.collisions.lock().await.push((collection, date));
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn prepare(&self, dataset: &Dataset) -> LoadResult<()> {
        let mut prepared = self.prepared.lock().await;
        if !prepared.contains(&dataset.collection) {
            prepared.push(dataset.collection);
        }
        Ok(())
    }

    async fn count(&self, dataset: &Dataset, date: NaiveDate) -> LoadResult<u64> {
        if let Some(n) = self.forced.lock().await.get(&(dataset.collection, date)) {
            return Ok(*n);
        }
        let docs = self.docs.lock().await;
        let n = docs
            .get(dataset.collection)
            .map(|v| v.iter().filter(|(d, _)| *d == date).count())
            .unwrap_or(0);
        Ok(n as u64)
    }

    async fn insert(
        &self,
        dataset: &Dataset,
        date: NaiveDate,
        payload: serde_json::Value,
    ) -> LoadResult<InsertOutcome> {
        if self
            .collisions
            .lock()
            .await
            .contains(&(dataset.collection, date))
        {
            return Ok(InsertOutcome::Duplicate);
        }
        let mut docs = self.docs.lock().await;
        let stored = docs.entry(dataset.collection).or_default();
        if stored.iter().any(|(d, _)| *d == date) {
            return Ok(InsertOutcome::Duplicate);
        }
        stored.push((date, payload));
        Ok(InsertOutcome::Inserted)
    }
}
