//! The sequential cache-or-fetch loop.

use std::sync::Arc;

use chrono::NaiveDate;
use fitbit_client::FitbitClient;
use tracing::{debug, info, warn};

use crate::catalog::{Dataset, MetricType};
use crate::dates::date_key;
use crate::error::{LoadError, LoadResult};
use crate::store::{InsertOutcome, RecordStore};

/// Outcome counts for one dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub collection: &'static str,
    pub fetched: u32,
    pub skipped: u32,
    pub duplicates: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub datasets: Vec<DatasetSummary>,
}

impl LoadSummary {
    pub fn fetched(&self) -> u32 {
        self.datasets.iter().map(|d| d.fetched).sum()
    }

    pub fn skipped(&self) -> u32 {
        self.datasets.iter().map(|d| d.skipped).sum()
    }

    pub fn duplicates(&self) -> u32 {
        self.datasets.iter().map(|d| d.duplicates).sum()
    }
}

pub struct Loader {
    client: Arc<dyn FitbitClient>,
    store: Arc<dyn RecordStore>,
}

impl Loader {
    pub fn new(client: Arc<dyn FitbitClient>, store: Arc<dyn RecordStore>) -> Self {
        Self { client, store }
    }

    /// Load every dataset of `metric` for each of `dates`, one request per
    /// day not already stored. Stops at the first provider or store error.
    pub async fn load(&self, metric: MetricType, dates: &[NaiveDate]) -> LoadResult<LoadSummary> {
        let keys: Vec<String> = dates.iter().copied().map(date_key).collect();
        info!(?metric, dates = ?keys, "preparing to load dates");

        let mut summary = LoadSummary::default();
        for dataset in metric.datasets() {
            summary.datasets.push(self.load_dataset(dataset, dates).await?);
        }
        Ok(summary)
    }

    pub async fn load_dataset(
        &self,
        dataset: &Dataset,
        dates: &[NaiveDate],
    ) -> LoadResult<DatasetSummary> {
        self.store.prepare(dataset).await?;

        let collection = dataset.collection;
        let mut summary = DatasetSummary {
            collection,
            ..Default::default()
        };

        for &date in dates {
            let key = date_key(date);
            debug!(collection, date = %key, "checking cache");

            let existing = self.store.count(dataset, date).await?;
            if existing > 1 {
                return Err(LoadError::DuplicateRecords {
                    collection: collection.to_string(),
                    date: key,
                    count: existing,
                });
            }
            if existing == 1 {
                info!(collection, date = %key, "record already stored, skipping");
                summary.skipped += 1;
                continue;
            }

            info!(collection, date = %key, "requesting data from provider");
            let payload = self.client.fetch(&dataset.request, date).await?;
            if dataset.record_date(&payload) != Some(key.as_str()) {
                debug!(
                    collection,
                    date = %key,
                    path = %dataset.payload_date_path(),
                    "response has no entry for this date"
                );
            }

            match self.store.insert(dataset, date, payload).await? {
                InsertOutcome::Inserted => {
                    info!(collection, date = %key, "wrote record");
                    summary.fetched += 1;
                }
                InsertOutcome::Duplicate => {
                    warn!(collection, date = %key, "entry already exists, record not written");
                    summary.duplicates += 1;
                }
            }
        }

        info!(
            collection,
            fetched = summary.fetched,
            skipped = summary.skipped,
            duplicates = summary.duplicates,
            "dataset done"
        );
        Ok(summary)
    }
}
