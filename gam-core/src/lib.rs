//! Lookup and comparison logic of the geo-assessment matrix.
//!
//! Everything runs against a [`Repository`] built once at start-up from a
//! [`gam_store::DataSource`]; the functions here are pure lookups over it.

pub mod assessment;
pub mod comparison;
pub mod config;
pub mod constraints;
pub mod logging;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod repository;

pub use assessment::assessment;
pub use comparison::{default_selection, AssessmentLine, Comparison, ConstraintList, FeatureDetails, FeaturePanel};
pub use config::{AppConfig, ConfigError, Reference};
pub use constraints::{extract_constraints, find_row, vocabulary, MatchPolicy};
pub use reconcile::{reconcile, Reconciliation};
pub use record::{AssessmentCell, FeatureRecord};
pub use report::render_text;
pub use repository::{Notice, Repository, RepositoryOptions, RepositoryStatus, TableError, TableStatus};
