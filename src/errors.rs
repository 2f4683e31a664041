//! Errors that can be raised while migrating a table.

use thiserror::Error;

pub use crate::binary::EncodeError;

/// Anything that can go wrong between claiming a table and finishing its
/// copy. Every variant is fatal for the enclosing table; there is no retry.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("connection failed: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("source query failed: {0}")]
    Query(#[source] r2d2_mysql::mysql::Error),

    #[error("COPY start failed: {0}")]
    CopyStart(#[source] postgres::Error),

    #[error("COPY stream write failed: {0}")]
    StreamWrite(#[source] std::io::Error),

    #[error("COPY finish failed: {0}")]
    CopyFinish(#[source] postgres::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{path} has no column named {column:?}")]
    CsvMissingColumn { path: String, column: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
