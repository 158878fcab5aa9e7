//! Macro that turns the table column lists into Arrow schemas and typed row decoders.

use std::collections::HashSet;

use arrow::array::{Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use gam_types::TableKind;

use crate::{clean_header, SchemaError};

/// One declared column of a typed table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Rust field name on the row struct.
    pub field: &'static str,
    /// Header in the source table (compared after trimming).
    pub column: &'static str,
    pub required: bool,
}

/// Decoded rows plus the set of declared columns the source carried.
#[derive(Clone, Debug)]
pub struct Decoded<T> {
    pub rows: Vec<T>,
    present: HashSet<&'static str>,
}

impl<T> Decoded<T> {
    /// Whether the source carried the declared column `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.present.contains(column)
    }
}

/// Column lookup resolved once per batch.
pub struct Layout<'a> {
    cols: Vec<(&'static ColumnSpec, Option<&'a StringArray>)>,
}

impl<'a> Layout<'a> {
    /// Match declared columns against the batch header; fail on a missing required column.
    pub fn resolve(
        table: TableKind,
        specs: &'static [ColumnSpec],
        batch: &'a RecordBatch,
    ) -> Result<Self, SchemaError> {
        let schema = batch.schema();
        let mut cols = Vec::with_capacity(specs.len());
        for spec in specs {
            let idx = schema
                .fields()
                .iter()
                .position(|f| clean_header(f.name()) == spec.column);
            let array = match idx {
                Some(i) => {
                    let field = schema.field(i);
                    if !matches!(field.data_type(), DataType::Utf8) {
                        return Err(SchemaError::ColumnType {
                            table,
                            column: spec.column.to_string(),
                            found: field.data_type().to_string(),
                        });
                    }
                    batch.column(i).as_any().downcast_ref::<StringArray>()
                }
                None if spec.required => {
                    return Err(SchemaError::MissingColumn {
                        table,
                        column: spec.column.to_string(),
                    })
                }
                None => None,
            };
            cols.push((spec, array));
        }
        Ok(Self { cols })
    }

    /// Cell text, `None` for null or blank cells and for absent columns.
    pub fn cell(&self, field: &str, row: usize) -> Option<String> {
        let (_, array) = self.cols.iter().find(|(spec, _)| spec.field == field)?;
        let array = (*array)?;
        if array.is_null(row) {
            return None;
        }
        let value = array.value(row);
        if value.trim().is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    pub fn present(&self) -> HashSet<&'static str> {
        self.cols
            .iter()
            .filter(|(_, a)| a.is_some())
            .map(|(spec, _)| spec.column)
            .collect()
    }

    pub fn into_decoded<T>(self, rows: Vec<T>) -> Decoded<T> {
        Decoded {
            present: self.present(),
            rows,
        }
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __is_required {
    (required) => {
        true
    };
    () => {
        false
    };
}

/// Declarative table definitions. Generates the row struct, its Arrow schema and a decoder.
#[macro_export]
macro_rules! define_tables {
    (
        $(
            $(#[$meta:meta])*
            table $Name:ident {
                kind: $kind:path,
                key: $key:ident,
                fields: {
                    $( $fname:ident : $col:literal $( $req:ident )? ),* $(,)?
                }
            }
        ),* $(,)?
    ) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, Default, PartialEq, Eq)]
            pub struct $Name {
                $( pub $fname: ::std::option::Option<String>, )*
            }

            impl $Name {
                pub const KIND: $crate::TableKind = $kind;

                pub const COLUMNS: &'static [$crate::macros::ColumnSpec] = &[
                    $(
                        $crate::macros::ColumnSpec {
                            field: stringify!($fname),
                            column: $col,
                            required: $crate::__is_required!($($req)?),
                        },
                    )*
                ];

                /// Arrow schema for this table: every column nullable UTF-8.
                pub fn schema() -> ::arrow::datatypes::Schema {
                    let fields = vec![
                        $(
                            ::arrow::datatypes::Field::new(
                                $col,
                                ::arrow::datatypes::DataType::Utf8,
                                true,
                            ),
                        )*
                    ];
                    ::arrow::datatypes::Schema::new(fields)
                }

                /// Cell backed by the declared source column `column`.
                pub fn get(&self, column: &str) -> ::std::option::Option<&str> {
                    $(
                        if column == $col {
                            return self.$fname.as_deref();
                        }
                    )*
                    None
                }

                /// Key cell of this row.
                pub fn key(&self) -> ::std::option::Option<&str> {
                    self.$key.as_deref()
                }

                /// Decode every row of `batch`; rows without a key are skipped.
                pub fn decode(
                    batch: &::arrow::record_batch::RecordBatch,
                ) -> ::std::result::Result<$crate::macros::Decoded<Self>, $crate::SchemaError> {
                    let layout = $crate::macros::Layout::resolve(Self::KIND, Self::COLUMNS, batch)?;
                    let mut rows = Vec::with_capacity(batch.num_rows());
                    for row in 0..batch.num_rows() {
                        let decoded = Self {
                            $( $fname: layout.cell(stringify!($fname), row), )*
                        };
                        let Some(key) = decoded.$key.as_deref() else { continue };
                        let key = key.trim().to_string();
                        rows.push(Self { $key: Some(key), ..decoded });
                    }
                    Ok(layout.into_decoded(rows))
                }
            }
        )*
    };
}
