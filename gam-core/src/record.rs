use gam_schema::FeatureRow;
use gam_types::{Assessment, FoundationType};
use serde::Serialize;
use tracing::warn;

/// State of one foundation-type cell of a feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "label", rename_all = "snake_case")]
pub enum AssessmentCell {
    /// The features table has no column for this foundation type.
    ColumnMissing,
    /// Column present, cell blank or not a recognised label.
    Blank,
    Rated(Assessment),
}

/// A feature with its typed attributes, after definition and comment enrichment.
#[derive(Clone, Debug, Serialize)]
pub struct FeatureRecord {
    pub name: String,
    pub setting: Option<String>,
    pub process: Option<String>,
    pub constraint_type: Option<String>,
    pub dominant_constraint: Option<String>,
    pub definition: Option<String>,
    pub comments: Option<String>,
    pub references: Vec<String>,
    assessments: [AssessmentCell; 4],
}

impl FeatureRecord {
    /// Build from a decoded row. `has_column` reports whether the source table carried a column.
    ///
    /// Returns `None` for rows without a key.
    pub fn from_row(row: FeatureRow, has_column: impl Fn(&str) -> bool) -> Option<Self> {
        let assessments = FoundationType::ALL.map(|foundation| {
            let column = foundation.column();
            if !has_column(column) {
                return AssessmentCell::ColumnMissing;
            }
            match row.get(column) {
                None => AssessmentCell::Blank,
                Some(text) => match Assessment::parse(text) {
                    Some(a) => AssessmentCell::Rated(a),
                    None => {
                        warn!(feature = ?row.key(), column, value = text, "unrecognised assessment label");
                        AssessmentCell::Blank
                    }
                },
            }
        });
        let name = row.geological_feature?;

        Some(Self {
            references: split_references(row.references.as_deref()),
            setting: row.setting,
            process: row.process,
            constraint_type: row.constraint_type,
            dominant_constraint: row.dominant_constraint,
            definition: row.definition,
            comments: row.comments,
            assessments,
            name,
        })
    }

    pub fn assessment_cell(&self, foundation: FoundationType) -> AssessmentCell {
        self.assessments[foundation as usize]
    }

    pub fn rating(&self, foundation: FoundationType) -> Option<Assessment> {
        match self.assessment_cell(foundation) {
            AssessmentCell::Rated(a) => Some(a),
            _ => None,
        }
    }
}

/// `References` cells hold several entries separated by semicolons.
fn split_references(cell: Option<&str>) -> Vec<String> {
    cell.map(|c| {
        c.split(';')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
