//! Feature-name alignment between the features table and a constraint table.

use std::collections::BTreeMap;

use gam_types::ConstraintDomain;
use serde::Serialize;

use crate::repository::Repository;

#[derive(Clone, Debug, Serialize)]
pub struct Candidate {
    pub feature: String,
    /// Constraint-table key that contains the feature name or is contained by it.
    pub row: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Reconciliation {
    pub domain: ConstraintDomain,
    pub features: usize,
    pub matched: usize,
    pub only_in_features: Vec<String>,
    pub only_in_constraints: Vec<String>,
    pub candidates: Vec<Candidate>,
}

impl Reconciliation {
    /// Share of feature names present in the constraint table, in percent.
    pub fn match_rate(&self) -> f64 {
        if self.features == 0 {
            return 0.0;
        }
        self.matched as f64 * 100.0 / self.features as f64
    }
}

fn normalise(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Names keyed by their normalised form, keeping the first spelling seen.
fn index<'a>(names: impl Iterator<Item = &'a str>) -> BTreeMap<String, &'a str> {
    let mut map = BTreeMap::new();
    for name in names {
        map.entry(normalise(name)).or_insert(name);
    }
    map
}

pub fn reconcile(repo: &Repository, domain: ConstraintDomain) -> Reconciliation {
    let features = index(repo.features().iter().map(|f| f.name.as_str()));
    let table = repo.constraint_table(domain);
    let rows = index(table.rows().iter().map(|r| r.key.as_str()));

    let only_in_features: Vec<String> = features
        .iter()
        .filter(|(k, _)| !rows.contains_key(*k))
        .map(|(_, v)| v.to_string())
        .collect();
    let only_in_constraints = rows
        .iter()
        .filter(|(k, _)| !features.contains_key(*k))
        .map(|(_, v)| v.to_string())
        .collect();

    let candidates = only_in_features
        .iter()
        .map(|feature| {
            let needle = normalise(feature);
            let row = table
                .rows()
                .iter()
                .map(|r| r.key.as_str())
                .find(|key| {
                    let key = normalise(key);
                    key.contains(&needle) || needle.contains(&key)
                })
                .map(str::to_string);
            Candidate {
                feature: feature.clone(),
                row,
            }
        })
        .collect();

    Reconciliation {
        domain,
        features: features.len(),
        matched: features.len() - only_in_features.len(),
        only_in_features,
        only_in_constraints,
        candidates,
    }
}
