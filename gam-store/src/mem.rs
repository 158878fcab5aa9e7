use std::collections::HashMap;
use std::sync::Arc;

use gam_types::TableKind;

use crate::csv_dir::parse_csv;
use crate::{DataError, DataSource, TableBatch, TableBatchHandle};

/// In-memory tables, for tests and for embedding the matrix without files.
///
/// Tables can also be primed with a failure so degraded rendering can be exercised.
#[derive(Default)]
pub struct InMemorySource {
    tables: HashMap<TableKind, Result<TableBatchHandle, String>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, table: TableKind, batch: TableBatch) -> Self {
        self.tables.insert(table, Ok(Arc::new(batch)));
        self
    }

    /// Parse `csv` the same way [`crate::CsvDirSource`] does and store it.
    pub fn with_csv(self, table: TableKind, csv: &str) -> Result<Self, DataError> {
        let batch = parse_csv(table, "memory", csv.as_bytes())?;
        Ok(self.with_batch(table, batch))
    }

    /// Make every load of `table` fail with a parse error.
    pub fn with_error(mut self, table: TableKind, message: &str) -> Self {
        self.tables.insert(table, Err(message.to_string()));
        self
    }
}

impl DataSource for InMemorySource {
    fn describe(&self) -> String {
        format!("memory ({} tables)", self.tables.len())
    }

    fn load(&self, table: TableKind) -> Result<TableBatchHandle, DataError> {
        match self.tables.get(&table) {
            Some(Ok(batch)) => Ok(Arc::clone(batch)),
            Some(Err(message)) => Err(DataError::Parse {
                table,
                location: "memory".into(),
                message: message.clone(),
            }),
            None => Err(DataError::SourceMissing {
                table,
                location: format!("memory#{table}"),
            }),
        }
    }
}
