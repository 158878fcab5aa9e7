//! The read-only repository every lookup runs against.
//!
//! A [`Repository`] is built once from a [`DataSource`] and never mutated. Each
//! table loads independently: a failed table becomes a [`Notice`] plus an empty
//! table, so the rest of the matrix keeps rendering.

use std::collections::{BTreeSet, HashMap};

use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use gam_schema::{
    CommentOverrideRow, ConstraintTable, FeatureRow, SchemaError, DEFAULT_METADATA_COLUMNS,
};
use gam_store::{DataError, DataSource};
use gam_types::{ConstraintDomain, TableKind};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::constraints::{extract_constraints, MatchPolicy};
use crate::record::FeatureRecord;

#[derive(Clone, Copy, Debug)]
pub struct RepositoryOptions {
    pub match_policy: MatchPolicy,
    /// Leading columns of a constraint table that are not constraints.
    pub metadata_columns: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::default(),
            metadata_columns: DEFAULT_METADATA_COLUMNS,
        }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl TableError {
    fn is_missing(&self) -> bool {
        matches!(self, TableError::Data(e) if e.is_missing())
    }
}

/// User-visible message about a table that could not be used.
#[derive(Clone, Debug, Serialize)]
pub struct Notice {
    pub table: TableKind,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TableStatus {
    pub table: TableKind,
    pub loaded: bool,
    pub rows: usize,
    pub columns: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RepositoryStatus {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub match_policy: MatchPolicy,
    pub features: usize,
    pub tables: Vec<TableStatus>,
    pub notices: Vec<Notice>,
}

pub struct Repository {
    source: String,
    loaded_at: DateTime<Utc>,
    options: RepositoryOptions,
    features: Vec<FeatureRecord>,
    geological: ConstraintTable,
    engineering: ConstraintTable,
    tables: Vec<TableStatus>,
    notices: Vec<Notice>,
}

impl Repository {
    /// Load every table from `source`. Never fails; problems are reported through [`Repository::notices`].
    pub fn load(source: &dyn DataSource, options: RepositoryOptions) -> Self {
        let mut tables = Vec::new();
        let mut notices = Vec::new();
        let mut track = |table: TableKind, outcome: Result<(usize, usize), &TableError>| {
            let status = match outcome {
                Ok((rows, columns)) => TableStatus {
                    table,
                    loaded: true,
                    rows,
                    columns,
                    error: None,
                },
                Err(e) => {
                    if !(table.is_optional() && e.is_missing()) {
                        warn!(%table, error = %e, "table unavailable");
                        notices.push(Notice {
                            table,
                            message: format!("Could not load {}: {e}", table.label()),
                        });
                    }
                    TableStatus {
                        table,
                        loaded: false,
                        rows: 0,
                        columns: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            tables.push(status);
        };

        let features = load_table(source, TableKind::Features, |b| {
            let decoded = FeatureRow::decode(b)?;
            let records: Vec<FeatureRecord> = decoded
                .rows
                .iter()
                .cloned()
                .filter_map(|row| FeatureRecord::from_row(row, |c| decoded.has_column(c)))
                .collect();
            Ok(records)
        });
        track(TableKind::Features, shape(&features));
        let mut features = features.map(|(_, r)| r).unwrap_or_default();

        let metadata = options.metadata_columns;
        let mut constraint_table = |domain: ConstraintDomain| {
            let kind = domain.table();
            let loaded = load_table(source, kind, |b| ConstraintTable::from_batch(kind, b, metadata).map_err(Into::into));
            track(kind, shape(&loaded));
            loaded.map(|(_, t)| t).unwrap_or_else(|_| ConstraintTable::empty())
        };
        let geological = constraint_table(ConstraintDomain::Geological);
        let engineering = constraint_table(ConstraintDomain::Engineering);

        let overrides = load_table(source, TableKind::CommentOverrides, |b| Ok(CommentOverrideRow::decode(b)?.rows));
        track(TableKind::CommentOverrides, shape(&overrides));
        let overrides = overrides.map(|(_, r)| r).unwrap_or_default();

        enrich(&mut features, &geological, &overrides);

        let repo = Self {
            source: source.describe(),
            loaded_at: Utc::now(),
            options,
            features,
            geological,
            engineering,
            tables,
            notices,
        };
        info!(
            source = %repo.source,
            features = repo.features.len(),
            notices = repo.notices.len(),
            "repository loaded"
        );
        repo
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.options.match_policy
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn features(&self) -> &[FeatureRecord] {
        &self.features
    }

    /// Sorted, de-duplicated feature names.
    pub fn feature_names(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|f| f.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First feature whose name equals `name`.
    pub fn resolve(&self, name: &str) -> Option<&FeatureRecord> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn constraint_table(&self, domain: ConstraintDomain) -> &ConstraintTable {
        match domain {
            ConstraintDomain::Geological => &self.geological,
            ConstraintDomain::Engineering => &self.engineering,
        }
    }

    /// Constraints of `domain` that apply to `name`, under the configured match policy.
    pub fn constraints(&self, name: &str, domain: ConstraintDomain) -> Vec<String> {
        extract_constraints(self.constraint_table(domain), name, self.options.match_policy)
    }

    pub fn status(&self) -> RepositoryStatus {
        RepositoryStatus {
            source: self.source.clone(),
            loaded_at: self.loaded_at,
            match_policy: self.options.match_policy,
            features: self.features.len(),
            tables: self.tables.clone(),
            notices: self.notices.clone(),
        }
    }
}

/// Number of usable rows after decoding; keyless rows are not counted.
trait RowCount {
    fn row_count(&self) -> usize;
}

impl<T> RowCount for Vec<T> {
    fn row_count(&self) -> usize {
        self.len()
    }
}

impl RowCount for ConstraintTable {
    fn row_count(&self) -> usize {
        self.len()
    }
}

fn load_table<T: RowCount>(
    source: &dyn DataSource,
    table: TableKind,
    decode: impl FnOnce(&RecordBatch) -> Result<T, TableError>,
) -> Result<((usize, usize), T), TableError> {
    let batch = source.load(table)?;
    let value = decode(&*batch)?;
    Ok(((value.row_count(), batch.num_columns()), value))
}

fn shape<T>(loaded: &Result<((usize, usize), T), TableError>) -> Result<(usize, usize), &TableError> {
    loaded.as_ref().map(|(shape, _)| *shape)
}

/// Definitions from the geological constraints table and comment overrides replace the features table text.
fn enrich(features: &mut [FeatureRecord], geological: &ConstraintTable, overrides: &[CommentOverrideRow]) {
    let definitions: HashMap<&str, &str> = geological
        .rows()
        .iter()
        .rev()
        .filter_map(|r| r.definition.as_deref().map(|d| (r.key.as_str(), d)))
        .collect();
    let comments: HashMap<&str, &str> = overrides
        .iter()
        .rev()
        .filter_map(|o| Some((o.key()?, o.comments.as_deref()?)))
        .collect();

    for feature in features.iter_mut() {
        if let Some(definition) = definitions.get(feature.name.as_str()) {
            feature.definition = Some(definition.to_string());
        }
        if let Some(comment) = comments.get(feature.name.as_str()) {
            feature.comments = Some(comment.to_string());
        }
    }
}
