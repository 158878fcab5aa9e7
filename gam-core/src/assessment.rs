use gam_types::{sentinel, FoundationType};

use crate::record::{AssessmentCell, FeatureRecord};

/// Assessment label of `record` for `foundation`, or the sentinel explaining why there is none.
pub fn assessment(record: Option<&FeatureRecord>, foundation: FoundationType) -> &'static str {
    let Some(record) = record else {
        return sentinel::DATA_NOT_AVAILABLE;
    };
    match record.assessment_cell(foundation) {
        AssessmentCell::Rated(a) => a.label(),
        AssessmentCell::ColumnMissing => sentinel::ASSESSMENT_NOT_AVAILABLE,
        AssessmentCell::Blank => sentinel::NO_ASSESSMENT,
    }
}
