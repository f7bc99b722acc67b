//! Error types for the loader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("API error: {0}")]
    Api(#[from] fitbit_client::FitbitError),

    #[error("storage error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error(
        "{count} documents for {date} in {collection}; the unique index on the record date is missing"
    )]
    DuplicateRecords {
        collection: String,
        date: String,
        count: u64,
    },
}

/// Result type alias for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;
