use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use gam_schema::{ConstraintRow, ConstraintTable};
use gam_types::CONSTRAINT_DENYLIST;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a feature name is matched against the key column of a constraint table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Key must equal the name.
    #[default]
    Exact,
    /// Exact, then the first key starting with the name, then the first key
    /// containing it ignoring case.
    Fallback,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchPolicy::Exact => "exact",
            MatchPolicy::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Error)]
#[error("unknown match policy {0:?} (expected exact or fallback)")]
pub struct UnknownMatchPolicy(pub String);

impl FromStr for MatchPolicy {
    type Err = UnknownMatchPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "fallback" => Ok(MatchPolicy::Fallback),
            _ => Err(UnknownMatchPolicy(s.to_string())),
        }
    }
}

pub fn is_denylisted(column: &str) -> bool {
    CONSTRAINT_DENYLIST.contains(&column.trim())
}

/// Row of `table` describing `name`, if any.
pub fn find_row<'a>(table: &'a ConstraintTable, name: &str, policy: MatchPolicy) -> Option<&'a ConstraintRow> {
    let rows = table.rows();
    if let Some(row) = rows.iter().find(|r| r.key == name) {
        return Some(row);
    }
    if policy == MatchPolicy::Exact || name.is_empty() {
        return None;
    }
    if let Some(row) = rows.iter().find(|r| r.key.starts_with(name)) {
        return Some(row);
    }
    let needle = name.to_lowercase();
    rows.iter().find(|r| r.key.to_lowercase().contains(&needle))
}

/// Constraint names marked for `name`, in column order, without denylisted columns or repeats.
pub fn extract_constraints(table: &ConstraintTable, name: &str, policy: MatchPolicy) -> Vec<String> {
    let Some(row) = find_row(table, name, policy) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| row.is_marked(*i))
        .map(|(_, c)| c.as_str())
        .filter(|c| !c.is_empty() && !is_denylisted(c) && seen.insert(*c))
        .map(str::to_string)
        .collect()
}

/// Declared constraint columns of `table` minus the denylist, de-duplicated, in order.
pub fn vocabulary(table: &ConstraintTable) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| !c.is_empty() && !is_denylisted(c) && seen.insert(*c))
        .map(str::to_string)
        .collect()
}
