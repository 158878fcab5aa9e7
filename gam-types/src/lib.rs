use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// The named tables the matrix is assembled from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Features,
    GeologicalConstraints,
    EngineeringConstraints,
    CommentOverrides,
}

impl TableKind {
    /// Every table, in load order.
    pub const ALL: [TableKind; 4] = [
        TableKind::Features,
        TableKind::GeologicalConstraints,
        TableKind::EngineeringConstraints,
        TableKind::CommentOverrides,
    ];

    /// Tables a complete GeoPackage must carry.
    pub const REQUIRED: [TableKind; 3] = [
        TableKind::Features,
        TableKind::GeologicalConstraints,
        TableKind::EngineeringConstraints,
    ];

    /// Table name inside the GeoPackage.
    pub const fn table_name(self) -> &'static str {
        match self {
            TableKind::Features => "geological_features",
            TableKind::GeologicalConstraints => "geological_constraints",
            TableKind::EngineeringConstraints => "engineering_constraints",
            TableKind::CommentOverrides => "comment_overrides",
        }
    }

    /// File name inside a CSV data directory.
    pub const fn csv_file(self) -> &'static str {
        match self {
            TableKind::Features => "geological_data.csv",
            TableKind::GeologicalConstraints => "reference-geological-constraints.csv",
            TableKind::EngineeringConstraints => "reference-engineering-constraints.csv",
            TableKind::CommentOverrides => "comment_overrides.csv",
        }
    }

    /// Human readable name used in notices.
    pub const fn label(self) -> &'static str {
        match self {
            TableKind::Features => "geological data",
            TableKind::GeologicalConstraints => "geological constraint data",
            TableKind::EngineeringConstraints => "engineering constraint data",
            TableKind::CommentOverrides => "comment overrides",
        }
    }

    /// Optional tables are silently empty when absent.
    pub const fn is_optional(self) -> bool {
        matches!(self, TableKind::CommentOverrides)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Offshore foundation categories rated per feature.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum FoundationType {
    Piles,
    SuctionCaisson,
    Gbs,
    Cables,
}

impl FoundationType {
    /// Display order of the assessment block.
    pub const ALL: [FoundationType; 4] = [
        FoundationType::Piles,
        FoundationType::SuctionCaisson,
        FoundationType::Gbs,
        FoundationType::Cables,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            FoundationType::Piles => "Piles",
            FoundationType::SuctionCaisson => "Suction Caisson",
            FoundationType::Gbs => "GBS",
            FoundationType::Cables => "Cables",
        }
    }

    /// Source column in the features table.
    pub const fn column(self) -> &'static str {
        match self {
            FoundationType::Piles => "Piles_Assessment",
            FoundationType::SuctionCaisson => "Suction_Caisson_Assessment",
            FoundationType::Gbs => "GBS_Assessment",
            FoundationType::Cables => "Cables_Assessment",
        }
    }
}

impl fmt::Display for FoundationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown foundation type: {0} (expected one of Piles, Suction Caisson, GBS, Cables)")]
pub struct UnknownFoundationType(pub String);

impl FromStr for FoundationType {
    type Err = UnknownFoundationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match norm.as_str() {
            "piles" | "pile" => Ok(FoundationType::Piles),
            "suctioncaisson" | "caisson" => Ok(FoundationType::SuctionCaisson),
            "gbs" => Ok(FoundationType::Gbs),
            "cables" | "cable" => Ok(FoundationType::Cables),
            _ => Err(UnknownFoundationType(s.to_string())),
        }
    }
}

/// Suitability label for a feature x foundation pair. Closed set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Assessment {
    Higher,
    Moderate,
    Lower,
}

impl Assessment {
    /// Label exactly as it appears in the source spreadsheet.
    pub const fn label(self) -> &'static str {
        match self {
            Assessment::Higher => "Higher Constraint",
            Assessment::Moderate => "Moderate constraint",
            Assessment::Lower => "Lower Constraint",
        }
    }

    /// Parse a cell; matching ignores case and surrounding whitespace.
    pub fn parse(cell: &str) -> Option<Self> {
        let norm = cell.trim().to_lowercase();
        match norm.as_str() {
            "higher constraint" => Some(Assessment::Higher),
            "moderate constraint" => Some(Assessment::Moderate),
            "lower constraint" => Some(Assessment::Lower),
            _ => None,
        }
    }

    pub const fn complexity(self) -> &'static str {
        match self {
            Assessment::Higher => "High",
            Assessment::Moderate => "Medium",
            Assessment::Lower => "Low",
        }
    }

    pub const fn css_class(self) -> &'static str {
        match self {
            Assessment::Higher => "higher-constraint",
            Assessment::Moderate => "moderate-constraint",
            Assessment::Lower => "lower-constraint",
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which constraint vocabulary a list was derived from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintDomain {
    Geological,
    Engineering,
}

impl ConstraintDomain {
    pub const ALL: [ConstraintDomain; 2] = [ConstraintDomain::Geological, ConstraintDomain::Engineering];

    pub const fn table(self) -> TableKind {
        match self {
            ConstraintDomain::Geological => TableKind::GeologicalConstraints,
            ConstraintDomain::Engineering => TableKind::EngineeringConstraints,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ConstraintDomain::Geological => "Geological",
            ConstraintDomain::Engineering => "Engineering",
        }
    }

    /// Shown in place of an empty constraint list.
    pub const fn none_identified(self) -> &'static str {
        match self {
            ConstraintDomain::Geological => "No geological constraints identified",
            ConstraintDomain::Engineering => "No engineering constraints identified",
        }
    }
}

/// Constraint columns that mark a verdict rather than a constraint.
pub const CONSTRAINT_DENYLIST: [&str; 3] = [
    "Unknown",
    "Potentially unsuitable",
    "Requires individual WTG siting investigation",
];

/// Fixed user-visible text for lookups that found nothing.
pub mod sentinel {
    pub const DATA_NOT_AVAILABLE: &str = "Data not available";
    pub const ASSESSMENT_NOT_AVAILABLE: &str = "Assessment not available";
    pub const NO_ASSESSMENT: &str = "No assessment available";
    pub const NO_DEFINITION: &str = "No definition available";
    pub const NO_COMMENTS: &str = "No comments available";
    pub const NO_FEATURES: &str = "No features available";
    pub const NO_CONSTRAINT_DATA: &str = "No constraint data available";
    pub const NO_ENGINEERING_COMMENTS: &str = "No engineering comments available";
    pub const NO_REFERENCES: &str = "No references available";
    pub const NOT_RECORDED: &str = "Not recorded";
}
