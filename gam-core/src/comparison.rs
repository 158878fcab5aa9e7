//! Two-column comparison view model shared by the HTML page, the JSON API and the text report.

use gam_types::{sentinel, Assessment, ConstraintDomain, FoundationType};
use serde::Serialize;

use crate::assessment::assessment;
use crate::repository::Repository;

#[derive(Clone, Debug, Serialize)]
pub struct AssessmentLine {
    pub foundation: FoundationType,
    /// Label or sentinel, ready to display.
    pub text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Assessment>,
}

impl AssessmentLine {
    pub fn complexity(&self) -> Option<&'static str> {
        self.rating.map(Assessment::complexity)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ConstraintList {
    pub domain: ConstraintDomain,
    pub items: Vec<String>,
}

impl ConstraintList {
    /// Items, or the single "none identified" line for an empty list.
    pub fn lines(&self) -> Vec<&str> {
        if self.items.is_empty() {
            vec![self.domain.none_identified()]
        } else {
            self.items.iter().map(String::as_str).collect()
        }
    }
}

/// Everything shown for a feature that resolved.
#[derive(Clone, Debug, Serialize)]
pub struct FeatureDetails {
    pub setting: String,
    pub process: String,
    pub constraint_type: String,
    pub dominant_constraint: String,
    pub definition: String,
    pub constraints: [ConstraintList; 2],
    pub comments: String,
    pub references: Vec<String>,
}

/// One column of the comparison.
#[derive(Clone, Debug, Serialize)]
pub struct FeaturePanel {
    /// 1 or 2.
    pub slot: usize,
    pub name: String,
    /// `None` when the name did not resolve.
    pub details: Option<FeatureDetails>,
    pub assessments: Vec<AssessmentLine>,
}

impl FeaturePanel {
    pub fn build(repo: &Repository, slot: usize, name: &str) -> Self {
        let record = repo.resolve(name);
        let assessments = FoundationType::ALL
            .into_iter()
            .map(|foundation| AssessmentLine {
                foundation,
                text: assessment(record, foundation),
                rating: record.and_then(|r| r.rating(foundation)),
            })
            .collect();

        let details = record.map(|r| {
            let text = |v: &Option<String>, placeholder: &str| {
                v.clone().unwrap_or_else(|| placeholder.to_string())
            };
            FeatureDetails {
                setting: text(&r.setting, sentinel::NOT_RECORDED),
                process: text(&r.process, sentinel::NOT_RECORDED),
                constraint_type: text(&r.constraint_type, sentinel::NOT_RECORDED),
                dominant_constraint: text(&r.dominant_constraint, sentinel::NOT_RECORDED),
                definition: text(&r.definition, sentinel::NO_DEFINITION),
                constraints: ConstraintDomain::ALL.map(|domain| ConstraintList {
                    domain,
                    items: repo.constraints(name, domain),
                }),
                comments: text(&r.comments, sentinel::NO_COMMENTS),
                references: r.references.clone(),
            }
        });

        Self {
            slot,
            name: name.to_string(),
            details,
            assessments,
        }
    }

    pub fn found(&self) -> bool {
        self.details.is_some()
    }

    pub fn characteristics_placeholder(&self) -> String {
        format!("No data available for Feature {}", self.slot)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub panels: [FeaturePanel; 2],
}

impl Comparison {
    pub fn build(repo: &Repository, first: &str, second: &str) -> Self {
        Self {
            panels: [
                FeaturePanel::build(repo, 1, first),
                FeaturePanel::build(repo, 2, second),
            ],
        }
    }
}

/// Names preselected in the two selectors: the first and second names, or the first twice.
pub fn default_selection(names: &[String]) -> (String, String) {
    match names {
        [] => (sentinel::NO_FEATURES.to_string(), sentinel::NO_FEATURES.to_string()),
        [only] => (only.clone(), only.clone()),
        [first, second, ..] => (first.clone(), second.clone()),
    }
}
