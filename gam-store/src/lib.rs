use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use gam_schema::SchemaError;
use gam_types::TableKind;
use thiserror::Error;

pub mod csv_dir;
pub use csv_dir::CsvDirSource;

pub mod geopackage;
pub use geopackage::GeoPackageSource;

pub mod gpkg;

pub mod fallback;
pub use fallback::FallbackSource;

pub mod mem;
pub use mem::InMemorySource;

pub type TableBatch = RecordBatch;
pub type TableBatchHandle = Arc<TableBatch>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{location} not found")]
    SourceMissing { table: TableKind, location: String },
    #[error("{location}: text is not valid UTF-8")]
    Encoding { table: TableKind, location: String },
    #[error("{location}: {message}")]
    Parse {
        table: TableKind,
        location: String,
        message: String,
    },
    #[error("database error on {location}: {source}")]
    Database {
        location: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("io error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl DataError {
    /// The backing store or table does not exist (as opposed to being unreadable).
    pub fn is_missing(&self) -> bool {
        matches!(self, DataError::SourceMissing { .. })
    }
}

/// Read access to the named tables. Every table arrives as one batch of nullable UTF-8 columns.
pub trait DataSource: Send + Sync {
    /// Where the data comes from, for logs and status output.
    fn describe(&self) -> String;

    /// Load a whole table.
    fn load(&self, table: TableKind) -> Result<TableBatchHandle, DataError>;
}

/// Source with no tables at all.
pub struct NullSource;

impl DataSource for NullSource {
    fn describe(&self) -> String {
        "none".into()
    }

    fn load(&self, table: TableKind) -> Result<TableBatchHandle, DataError> {
        Err(DataError::SourceMissing {
            table,
            location: format!("{table} (no data source configured)"),
        })
    }
}
