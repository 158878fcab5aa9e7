#![forbid(unsafe_code)]

pub mod constraint;
pub mod macros;

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use thiserror::Error;

pub use constraint::{ConstraintRow, ConstraintTable};
pub use gam_types::TableKind;
pub use macros::{ColumnSpec, Decoded};

/// Number of leading columns in a constraint table that describe the feature
/// (key, setting, process, definition) rather than a constraint.
pub const DEFAULT_METADATA_COLUMNS: usize = 4;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table {table}: required column {column:?} is missing")]
    MissingColumn { table: TableKind, column: String },
    #[error("table {table}: column {column:?} has type {found}, expected utf8")]
    ColumnType {
        table: TableKind,
        column: String,
        found: String,
    },
    #[error("table {table}: no constraint columns after the first {metadata} metadata columns")]
    NoConstraintColumns { table: TableKind, metadata: usize },
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Header as compared against declared column names: BOM stripped, trimmed.
pub fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

/// Build the in-memory form every table shares: one nullable UTF-8 column per header.
///
/// Short rows are padded with nulls; cells beyond the header are dropped.
pub fn text_batch(
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
) -> Result<RecordBatch, SchemaError> {
    let fields: Vec<Field> = headers
        .iter()
        .map(|h| Field::new(h.as_str(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); headers.len()];
    for row in rows {
        let mut cells = row.into_iter();
        for column in columns.iter_mut() {
            column.push(cells.next().flatten());
        }
    }
    let arrays: Vec<ArrayRef> = columns
        .into_iter()
        .map(|c| Arc::new(StringArray::from(c)) as ArrayRef)
        .collect();

    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Typed tables of the geo-assessment matrix.
pub mod generated {
    use crate::define_tables;

    define_tables! {
        /// One row of `geological_features`.
        table FeatureRow {
            kind: crate::TableKind::Features,
            key: geological_feature,
            fields: {
                geological_feature: "Geological_Feature" required,
                setting: "Setting",
                process: "Process",
                constraint_type: "Constraint_Type",
                dominant_constraint: "Dominant_Constraint",
                definition: "Definition",
                comments: "Comments",
                piles_assessment: "Piles_Assessment",
                suction_caisson_assessment: "Suction_Caisson_Assessment",
                gbs_assessment: "GBS_Assessment",
                cables_assessment: "Cables_Assessment",
                references: "References",
            }
        },

        /// One row of `comment_overrides`.
        table CommentOverrideRow {
            kind: crate::TableKind::CommentOverrides,
            key: geological_feature,
            fields: {
                geological_feature: "Geological_Feature" required,
                comments: "Comments",
            }
        }
    }
}

pub use generated::*;
