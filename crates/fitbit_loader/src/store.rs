//! Record storage: one document per (day, dataset), backed by MongoDB.
//!
//! A stored document is the provider's raw response plus a top-level
//! [`DATE_FIELD`] holding the day it was requested for. Responses without an
//! entry for the day (a night with no sleep log) are therefore still found on
//! later runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::{self, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use crate::catalog::Dataset;
use crate::dates::date_key;
use crate::error::{LoadError, LoadResult};

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "fitbit";

/// Top-level field carrying the requested day, `YYYY-MM-DD`.
pub const DATE_FIELD: &str = "date";

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The unique index already holds a record for this day.
    Duplicate,
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Create the dataset's collection and its unique date index if missing.
    async fn prepare(&self, dataset: &Dataset) -> LoadResult<()>;

    /// Number of stored records for `date`.
    async fn count(&self, dataset: &Dataset, date: NaiveDate) -> LoadResult<u64>;

    /// Store a provider response for `date`.
    async fn insert(
        &self,
        dataset: &Dataset,
        date: NaiveDate,
        payload: serde_json::Value,
    ) -> LoadResult<InsertOutcome>;
}

pub struct MongoRecordStore {
    db: Database,
}

impl MongoRecordStore {
    pub async fn connect(uri: &str, database: &str) -> LoadResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client.database(database)))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, dataset: &Dataset) -> Collection<Document> {
        self.db.collection(dataset.collection)
    }
}

/// `{ date: 1 }`
pub fn index_keys() -> Document {
    let mut keys = Document::new();
    keys.insert(DATE_FIELD, 1i32);
    keys
}

/// Matches the day by its top-level date, or by the date inside the payload
/// for documents stored without one.
pub fn date_filter(dataset: &Dataset, date: NaiveDate) -> Document {
    let key = date_key(date);
    let mut by_field = Document::new();
    by_field.insert(DATE_FIELD, key.clone());
    let mut by_payload = Document::new();
    by_payload.insert(dataset.payload_date_path(), key);

    let mut filter = Document::new();
    filter.insert(
        "$or",
        vec![Bson::Document(by_field), Bson::Document(by_payload)],
    );
    filter
}

/// Convert a provider response into a storable document stamped with `date`.
pub fn payload_document(payload: &serde_json::Value, date: NaiveDate) -> LoadResult<Document> {
    if !payload.is_object() {
        return Err(LoadError::InvalidPayload(format!(
            "expected a JSON object, got {payload}"
        )));
    }
    if payload.get(DATE_FIELD).is_some() {
        return Err(LoadError::InvalidPayload(format!(
            "response already has a top-level `{DATE_FIELD}` field"
        )));
    }
    let mut doc =
        bson::to_document(payload).map_err(|e| LoadError::InvalidPayload(e.to_string()))?;
    doc.insert(DATE_FIELD, date_key(date));
    Ok(doc)
}

fn is_duplicate_code(code: i32) -> bool {
    code == DUPLICATE_KEY
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if is_duplicate_code(we.code)
    )
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn prepare(&self, dataset: &Dataset) -> LoadResult<()> {
        let existing = self.db.list_collection_names().await?;
        if !existing.iter().any(|name| name == dataset.collection) {
            tracing::info!(collection = dataset.collection, "creating collection");
            self.db.create_collection(dataset.collection).await?;
        }
        // Sparse so documents stored without the field don't collide on null.
        let index = IndexModel::builder()
            .keys(index_keys())
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();
        self.collection(dataset).create_index(index).await?;
        Ok(())
    }

    async fn count(&self, dataset: &Dataset, date: NaiveDate) -> LoadResult<u64> {
        let filter = date_filter(dataset, date);
        let n = self.collection(dataset).count_documents(filter.clone()).await?;
        tracing::debug!(collection = dataset.collection, %filter, documents = n, "cache query");
        Ok(n)
    }

    async fn insert(
        &self,
        dataset: &Dataset,
        date: NaiveDate,
        payload: serde_json::Value,
    ) -> LoadResult<InsertOutcome> {
        let doc = payload_document(&payload, date)?;
        match self.collection(dataset).insert_one(doc).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }
}
