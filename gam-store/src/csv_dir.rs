use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use csv::ReaderBuilder;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use gam_schema::{clean_header, text_batch};
use gam_types::TableKind;
use tracing::{debug, warn};

use crate::{DataError, DataSource, TableBatchHandle};

/// Directory holding one CSV file per table (see [`TableKind::csv_file`]).
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, table: TableKind) -> PathBuf {
        self.dir.join(table.csv_file())
    }
}

impl DataSource for CsvDirSource {
    fn describe(&self) -> String {
        format!("csv directory {}", self.dir.display())
    }

    fn load(&self, table: TableKind) -> Result<TableBatchHandle, DataError> {
        let path = self.path_for(table);
        let location = path.display().to_string();
        if !path.exists() {
            return Err(DataError::SourceMissing { table, location });
        }
        let bytes = fs::read(&path).map_err(|source| DataError::Io {
            location: location.clone(),
            source,
        })?;
        let batch = parse_csv(table, &location, &bytes)?;
        debug!(%table, rows = batch.num_rows(), columns = batch.num_columns(), "loaded csv");
        Ok(Arc::new(batch))
    }
}

/// Decode bytes as UTF-8 (BOM removed), falling back to Windows-1252.
///
/// Windows-1252 maps every byte, so decoding always succeeds; the returned
/// encoding says which one was used.
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return (text, UTF_8);
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (text, WINDOWS_1252)
}

/// Parse CSV bytes into a text batch. Headers are cleaned, empty cells become null.
pub fn parse_csv(table: TableKind, location: &str, bytes: &[u8]) -> Result<RecordBatch, DataError> {
    let (text, encoding) = decode_text(bytes);
    if encoding != UTF_8 {
        warn!(%table, location, encoding = encoding.name(), "csv is not UTF-8, decoded with fallback encoding");
    }

    let parse_err = |e: csv::Error| DataError::Parse {
        table,
        location: location.to_string(),
        message: e.to_string(),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(|h| clean_header(h).to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(DataError::Parse {
            table,
            location: location.to_string(),
            message: "missing header row".into(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_err)?;
        rows.push(
            record
                .iter()
                .map(|c| (!c.is_empty()).then(|| c.to_string()))
                .collect(),
        );
    }

    Ok(text_batch(headers, rows)?)
}
