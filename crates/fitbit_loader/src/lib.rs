//! Per-day Fitbit cache: fetch each missing (day, dataset) once and store the
//! provider's response in MongoDB.

pub mod callback;
pub mod catalog;
pub mod cli;
pub mod dates;
pub mod error;
pub mod loader;
pub mod logging;
pub mod store;

mod test_utils;

pub use catalog::{Dataset, MetricType};
pub use error::{LoadError, LoadResult};
pub use loader::{DatasetSummary, LoadSummary, Loader};
pub use store::{InsertOutcome, MongoRecordStore, RecordStore};
