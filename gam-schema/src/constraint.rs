//! Constraint tables: a feature key, a few metadata columns, then one "x"-marked column per constraint.

use arrow::array::{Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use gam_types::TableKind;

use crate::{clean_header, SchemaError};

const DEFINITION_HEADER: &str = "Definition";

/// One feature row of a constraint table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintRow {
    /// Feature name, trimmed.
    pub key: String,
    pub definition: Option<String>,
    marks: Vec<bool>,
}

impl ConstraintRow {
    /// Whether the constraint at `column` (index into [`ConstraintTable::columns`]) is marked.
    pub fn is_marked(&self, column: usize) -> bool {
        self.marks.get(column).copied().unwrap_or(false)
    }
}

#[derive(Clone, Debug)]
pub struct ConstraintTable {
    key_column: String,
    columns: Vec<String>,
    rows: Vec<ConstraintRow>,
}

impl ConstraintTable {
    /// Table with no rows, used when a load failed.
    pub fn empty() -> Self {
        Self {
            key_column: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Validate and decode a loaded batch.
    ///
    /// The first column is the key. Columns `metadata..` are constraints; a
    /// `Definition` header among the metadata columns feeds [`ConstraintRow::definition`].
    pub fn from_batch(
        kind: TableKind,
        batch: &RecordBatch,
        metadata: usize,
    ) -> Result<Self, SchemaError> {
        let schema = batch.schema();
        let metadata = metadata.max(1);

        let mut arrays = Vec::with_capacity(batch.num_columns());
        for (i, field) in schema.fields().iter().enumerate() {
            let array = match field.data_type() {
                DataType::Utf8 => batch.column(i).as_any().downcast_ref::<StringArray>(),
                _ => None,
            };
            let Some(array) = array else {
                return Err(SchemaError::ColumnType {
                    table: kind,
                    column: field.name().clone(),
                    found: field.data_type().to_string(),
                });
            };
            arrays.push(array);
        }

        let Some(key_array) = arrays.first() else {
            return Err(SchemaError::MissingColumn {
                table: kind,
                column: "feature name".into(),
            });
        };
        if arrays.len() <= metadata {
            return Err(SchemaError::NoConstraintColumns {
                table: kind,
                metadata,
            });
        }

        let headers: Vec<&str> = schema.fields().iter().map(|f| clean_header(f.name())).collect();
        let definition_idx = headers[..metadata]
            .iter()
            .position(|h| *h == DEFINITION_HEADER);
        let columns: Vec<String> = headers[metadata..].iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let Some(key) = text(key_array, row) else { continue };
            let definition = definition_idx.and_then(|i| text(arrays[i], row));
            let marks = arrays[metadata..]
                .iter()
                .map(|a| text(a, row).is_some_and(|c| is_mark(&c)))
                .collect();
            rows.push(ConstraintRow {
                key,
                definition,
                marks,
            });
        }

        Ok(Self {
            key_column: headers[0].to_string(),
            columns,
            rows,
        })
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Declared constraint columns in source order, headers trimmed.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ConstraintRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// "x" in any case, surrounded by any whitespace.
pub fn is_mark(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case("x")
}

fn text(array: &StringArray, row: usize) -> Option<String> {
    if array.is_null(row) {
        return None;
    }
    let value = array.value(row).trim();
    (!value.is_empty()).then(|| value.to_string())
}
