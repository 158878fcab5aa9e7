use std::sync::Arc;

use gam_types::TableKind;
use tracing::debug;

use crate::{DataError, DataSource, TableBatchHandle};

/// Combines two sources per table:
/// - the primary store (normally the GeoPackage), and
/// - a secondary store consulted only when the primary does not have the table at all.
///
/// Read or parse failures on the primary are returned as-is so a corrupt store
/// is reported instead of silently shadowed.
pub struct FallbackSource {
    pub primary: Arc<dyn DataSource>,
    pub secondary: Arc<dyn DataSource>,
}

impl FallbackSource {
    pub fn new(primary: Arc<dyn DataSource>, secondary: Arc<dyn DataSource>) -> Self {
        Self { primary, secondary }
    }
}

impl DataSource for FallbackSource {
    fn describe(&self) -> String {
        format!(
            "{} (fallback: {})",
            self.primary.describe(),
            self.secondary.describe()
        )
    }

    fn load(&self, table: TableKind) -> Result<TableBatchHandle, DataError> {
        match self.primary.load(table) {
            Err(e) if e.is_missing() => {
                debug!(%table, reason = %e, "primary source missing table, trying fallback");
                self.secondary.load(table)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemorySource, NullSource};

    #[test]
    fn missing_tables_fall_through_to_secondary() {
        let secondary = InMemorySource::new()
            .with_csv(TableKind::Features, "Geological_Feature\nSand\n")
            .unwrap();
        let src = FallbackSource::new(Arc::new(NullSource), Arc::new(secondary));
        assert_eq!(src.load(TableKind::Features).unwrap().num_rows(), 1);
        assert!(src.load(TableKind::GeologicalConstraints).unwrap_err().is_missing());
    }

    #[test]
    fn primary_errors_other_than_missing_are_not_shadowed() {
        let primary = InMemorySource::new().with_error(TableKind::Features, "broken");
        let secondary = InMemorySource::new()
            .with_csv(TableKind::Features, "Geological_Feature\nSand\n")
            .unwrap();
        let src = FallbackSource::new(Arc::new(primary), Arc::new(secondary));
        let err = src.load(TableKind::Features).unwrap_err();
        assert!(matches!(err, DataError::Parse { .. }));
    }
}
