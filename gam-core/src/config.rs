use std::fs;
use std::path::{Path, PathBuf};

use gam_schema::DEFAULT_METADATA_COLUMNS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraints::{MatchPolicy, UnknownMatchPolicy};
use crate::repository::RepositoryOptions;

/// Link shown in the page header.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub geopackage: PathBuf,
    pub csv_dir: PathBuf,
    pub match_policy: MatchPolicy,
    pub metadata_columns: usize,
    pub bind: String,
    pub references: Vec<Reference>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geopackage: PathBuf::from("data/geological_data.gpkg"),
            csv_dir: PathBuf::from("data"),
            match_policy: MatchPolicy::Exact,
            metadata_columns: DEFAULT_METADATA_COLUMNS,
            bind: "0.0.0.0:8501".into(),
            references: vec![
                Reference {
                    title: "Data".into(),
                    url: "https://www.data.gov.uk/dataset/c109cb6c-a32e-482b-a4e4-131d24a76f7f/the-geo-assessment-matrix-pan-european-catalogue-of-key-parameters-for-offshore-wind-farm-sitin".into(),
                },
                Reference {
                    title: "Methodology".into(),
                    url: "https://www.geologicalservice.eu/upload/content/1691/gseu_d5-3_pan-european-catalogue-of-key-parameters-for-offshore-windfarm-siting_v1.pdf".into(),
                },
                Reference {
                    title: "EGDI".into(),
                    url: "https://www.europe-geology.eu/".into(),
                },
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{var}: {source}")]
    MatchPolicy {
        var: &'static str,
        #[source]
        source: UnknownMatchPolicy,
    },
    #[error("metadata_columns must be at least 1")]
    MetadataColumns,
}

impl AppConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: AppConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.check()
    }

    /// File named by `explicit` or `GAM_CONFIG` if any, defaults otherwise, then environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os("GAM_CONFIG").map(PathBuf::from);
        let cfg = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        cfg.with_env(|key| std::env::var(key).ok())
    }

    /// Apply `GAM_GEOPACKAGE`, `GAM_CSV_DIR`, `GAM_BIND` and `GAM_MATCH_POLICY`.
    pub fn with_env(mut self, get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("GAM_GEOPACKAGE") {
            self.geopackage = PathBuf::from(v);
        }
        if let Some(v) = get("GAM_CSV_DIR") {
            self.csv_dir = PathBuf::from(v);
        }
        if let Some(v) = get("GAM_BIND") {
            self.bind = v;
        }
        if let Some(v) = get("GAM_MATCH_POLICY") {
            self.match_policy = v.parse().map_err(|source| ConfigError::MatchPolicy {
                var: "GAM_MATCH_POLICY",
                source,
            })?;
        }
        Ok(self)
    }

    fn check(self) -> Result<Self, ConfigError> {
        if self.metadata_columns == 0 {
            return Err(ConfigError::MetadataColumns);
        }
        Ok(self)
    }

    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            match_policy: self.match_policy,
            metadata_columns: self.metadata_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gam.yaml");
        fs::write(&path, "match_policy: fallback\nbind: 127.0.0.1:9000\n").unwrap();
        let cfg = AppConfig::from_path(&path).unwrap();
        assert_eq!(cfg.match_policy, MatchPolicy::Fallback);
        assert_eq!(cfg.bind, "127.0.0.1:9000");
        assert_eq!(cfg.metadata_columns, 4);
        assert_eq!(cfg.references.len(), 3);
    }

    #[test]
    fn zero_metadata_columns_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gam.yaml");
        fs::write(&path, "metadata_columns: 0\n").unwrap();
        assert!(matches!(AppConfig::from_path(&path), Err(ConfigError::MetadataColumns)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("GAM_CSV_DIR", "/srv/gam/csv"),
            ("GAM_MATCH_POLICY", "Fallback"),
            ("GAM_BIND", " "),
        ]
        .into_iter()
        .collect();
        let cfg = AppConfig::default()
            .with_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.csv_dir, PathBuf::from("/srv/gam/csv"));
        assert_eq!(cfg.match_policy, MatchPolicy::Fallback);
        assert_eq!(cfg.bind, "0.0.0.0:8501");
    }

    #[test]
    fn bad_policy_in_environment_is_an_error() {
        let err = AppConfig::default()
            .with_env(|k| (k == "GAM_MATCH_POLICY").then(|| "fuzzy".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("GAM_MATCH_POLICY"));
    }
}
