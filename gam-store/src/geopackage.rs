use std::path::{Path, PathBuf};
use std::sync::Arc;

use gam_schema::{clean_header, text_batch};
use gam_types::TableKind;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use crate::{DataError, DataSource, TableBatchHandle};

/// Read-only access to the tables of a GeoPackage (an SQLite file).
pub struct GeoPackageSource {
    path: PathBuf,
}

impl GeoPackageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self, table: TableKind) -> String {
        format!("{}#{}", self.path.display(), table.table_name())
    }

    fn open(&self, table: TableKind) -> Result<Connection, DataError> {
        // Opening a missing path would create an empty database.
        if !self.path.exists() {
            return Err(DataError::SourceMissing {
                table,
                location: self.path.display().to_string(),
            });
        }
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| DataError::Database {
            location: self.path.display().to_string(),
            source,
        })
    }
}

impl DataSource for GeoPackageSource {
    fn describe(&self) -> String {
        format!("geopackage {}", self.path.display())
    }

    fn load(&self, table: TableKind) -> Result<TableBatchHandle, DataError> {
        let conn = self.open(table)?;
        let location = self.location(table);
        let db_err = |source| DataError::Database {
            location: location.clone(),
            source,
        };

        if !table_exists(&conn, table.table_name()).map_err(db_err)? {
            return Err(DataError::SourceMissing { table, location });
        }

        let sql = format!("SELECT * FROM {}", quote_ident(table.table_name()));
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let headers: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|h| clean_header(h).to_string())
            .collect();
        let width = headers.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(db_err)?;
        while let Some(row) = cursor.next().map_err(db_err)? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                let cell = match row.get_ref(i).map_err(db_err)? {
                    ValueRef::Null => None,
                    ValueRef::Integer(v) => Some(v.to_string()),
                    ValueRef::Real(v) => Some(v.to_string()),
                    ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                        Ok(s) if s.is_empty() => None,
                        Ok(s) => Some(s.to_string()),
                        Err(_) => {
                            return Err(DataError::Encoding {
                                table,
                                location: location.clone(),
                            })
                        }
                    },
                    ValueRef::Blob(_) => {
                        return Err(DataError::Parse {
                            table,
                            location: location.clone(),
                            message: format!("column {:?} holds binary data", headers[i]),
                        })
                    }
                };
                cells.push(cell);
            }
            rows.push(cells);
        }

        let batch = text_batch(headers, rows)?;
        debug!(%table, rows = batch.num_rows(), "loaded geopackage table");
        Ok(Arc::new(batch))
    }
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

/// Double-quote an SQLite identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray};

    fn fixture(dir: &Path) -> PathBuf {
        let path = dir.join("matrix.gpkg");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE geological_features (Geological_Feature TEXT, Depth INTEGER, Ratio REAL, Notes TEXT);
             INSERT INTO geological_features VALUES ('Sand', 20, 0.5, NULL);
             INSERT INTO geological_features VALUES ('Gravel', NULL, NULL, '');",
        )
        .unwrap();
        path
    }

    #[test]
    fn reads_cells_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let src = GeoPackageSource::new(fixture(dir.path()));
        let batch = src.load(TableKind::Features).unwrap();
        assert_eq!(batch.num_rows(), 2);
        let depth = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(depth.value(0), "20");
        assert!(depth.is_null(1));
        let ratio = batch.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(ratio.value(0), "0.5");
        let notes = batch.column(3).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(notes.is_null(0) && notes.is_null(1));
    }

    #[test]
    fn missing_table_and_missing_file_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let src = GeoPackageSource::new(fixture(dir.path()));
        assert!(src.load(TableKind::EngineeringConstraints).unwrap_err().is_missing());

        let absent = GeoPackageSource::new(dir.path().join("absent.gpkg"));
        assert!(absent.load(TableKind::Features).unwrap_err().is_missing());
        assert!(!dir.path().join("absent.gpkg").exists());
    }

    fn single_cell(dir: &Path, value_sql: &str) -> GeoPackageSource {
        let path = dir.join("cell.gpkg");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE engineering_constraints (Geological_Feature TEXT, Scour TEXT);
             INSERT INTO engineering_constraints VALUES ('Sand', 'x');
             INSERT INTO engineering_constraints VALUES ('Gravel', {value_sql});"
        ))
        .unwrap();
        GeoPackageSource::new(path)
    }

    #[test]
    fn invalid_utf8_text_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = single_cell(dir.path(), "CAST(X'FF41' AS TEXT)");
        let err = src.load(TableKind::EngineeringConstraints).unwrap_err();
        assert!(matches!(
            err,
            DataError::Encoding { table: TableKind::EngineeringConstraints, .. }
        ));
        assert!(!err.is_missing());
    }

    #[test]
    fn blob_cells_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = single_cell(dir.path(), "X'00'");
        let err = src.load(TableKind::EngineeringConstraints).unwrap_err();
        match err {
            DataError::Parse { message, .. } => assert!(message.contains("Scour")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_file_is_reported_not_shadowed_by_csv() {
        use crate::{CsvDirSource, FallbackSource};

        let dir = tempfile::tempdir().unwrap();
        let gpkg = dir.path().join("geological_data.gpkg");
        std::fs::write(&gpkg, "this is not an sqlite database, just some text\n".repeat(32)).unwrap();
        std::fs::write(
            dir.path().join(TableKind::Features.csv_file()),
            "Geological_Feature\nSand\n",
        )
        .unwrap();

        let src = FallbackSource::new(
            Arc::new(GeoPackageSource::new(&gpkg)),
            Arc::new(CsvDirSource::new(dir.path())),
        );
        let err = src.load(TableKind::Features).unwrap_err();
        assert!(!err.is_missing());
        assert!(matches!(err, DataError::Database { .. }), "{err}");
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
