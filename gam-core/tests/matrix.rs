use std::path::PathBuf;

use chrono::TimeZone;
use gam_core::*;
use gam_store::CsvDirSource;
use gam_types::{Assessment, ConstraintDomain, FoundationType, CONSTRAINT_DENYLIST};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data")
}

fn repo(policy: MatchPolicy) -> Repository {
    let options = RepositoryOptions {
        match_policy: policy,
        ..RepositoryOptions::default()
    };
    Repository::load(&CsvDirSource::new(data_dir()), options)
}

#[test]
fn sand_assessments_and_constraints() {
    let repo = repo(MatchPolicy::Exact);
    assert!(repo.notices().is_empty(), "{:?}", repo.notices());

    let sand = repo.resolve("Sand");
    assert_eq!(assessment(sand, FoundationType::Piles), "Lower Constraint");
    assert_eq!(assessment(sand, FoundationType::SuctionCaisson), "Moderate constraint");
    assert_eq!(assessment(sand, FoundationType::Gbs), "Higher Constraint");
    assert_eq!(assessment(sand, FoundationType::Cables), "Lower Constraint");

    assert_eq!(
        repo.constraints("Sand", ConstraintDomain::Geological),
        vec!["Coarse soil units (including gravel)"]
    );
    assert_eq!(
        repo.constraints("Sand", ConstraintDomain::Engineering),
        vec!["Trenching technique selection", "Scour - removal of lateral support"]
    );
}

#[test]
fn peat_matches_engineering_row_only_under_fallback() {
    let exact = repo(MatchPolicy::Exact);
    let geo = exact.constraints("Peat (organic-rich)", ConstraintDomain::Geological);
    assert!(geo.contains(&"Organic soils/gassy sediments".to_string()));
    assert!(exact
        .constraints("Peat (organic-rich)", ConstraintDomain::Engineering)
        .is_empty());

    let fallback = repo(MatchPolicy::Fallback);
    assert_eq!(
        fallback.constraints("Peat (organic-rich)", ConstraintDomain::Engineering),
        vec![
            "Compressible/ contractive soils",
            "Trenching technique selection",
            "Reduced shaft friction - soft sediments"
        ]
    );
}

#[test]
fn unknown_feature_renders_placeholders() {
    let repo = repo(MatchPolicy::Exact);
    assert!(repo.resolve("Nonexistent Feature").is_none());
    for f in FoundationType::ALL {
        assert_eq!(assessment(None, f), "Data not available");
    }

    let cmp = Comparison::build(&repo, "Sand", "Nonexistent Feature");
    let missing = &cmp.panels[1];
    assert!(!missing.found());
    assert_eq!(missing.characteristics_placeholder(), "No data available for Feature 2");
    assert!(missing.assessments.iter().all(|a| a.text == "Data not available"));

    let text = render_text(&cmp, chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    assert!(text.contains("Generated: 2024-05-01 12:00 UTC"));
    assert!(text.contains("No data available for Feature 2"));
    assert!(text.contains("No constraint data available"));
    assert!(text.contains("No engineering comments available"));
    assert!(text.contains("No references available"));
}

#[test]
fn denylisted_columns_never_surface() {
    let repo = repo(MatchPolicy::Fallback);
    for name in repo.feature_names() {
        for domain in ConstraintDomain::ALL {
            let list = repo.constraints(&name, domain);
            for denied in CONSTRAINT_DENYLIST {
                assert!(!list.iter().any(|c| c == denied), "{name}: {denied} in {list:?}");
            }
        }
    }
}

#[test]
fn vocabulary_is_declared_columns_minus_denylist() {
    let repo = repo(MatchPolicy::Exact);
    let eng = repo.constraint_table(ConstraintDomain::Engineering);
    let vocab = vocabulary(eng);
    assert_eq!(vocab.len(), eng.columns().len() - 3);
    assert!(vocab.iter().all(|c| eng.columns().contains(c)));

    let geo = vocabulary(repo.constraint_table(ConstraintDomain::Geological));
    assert!(geo.contains(&"Soft  soil units - low shear strength".to_string()));
    assert!(!geo.contains(&"Unknown".to_string()));
}

#[test]
fn every_present_feature_has_closed_set_labels() {
    let repo = repo(MatchPolicy::Exact);
    let allowed = [
        "Higher Constraint",
        "Moderate constraint",
        "Lower Constraint",
        "No assessment available",
        "Assessment not available",
    ];
    for name in repo.feature_names() {
        let record = repo.resolve(&name);
        assert!(record.is_some());
        for f in FoundationType::ALL {
            assert!(allowed.contains(&assessment(record, f)), "{name} / {f}");
        }
    }
}

#[test]
fn shallow_gas_is_enriched_from_side_tables() {
    let repo = repo(MatchPolicy::Exact);
    let gas = repo.resolve("Shallow gas").unwrap();
    assert!(gas.definition.as_deref().unwrap().starts_with("Accumulations of gas"));
    assert!(gas.comments.as_deref().unwrap().starts_with("Gas-charged sediments"));
    assert_eq!(gas.rating(FoundationType::Gbs), None);
    assert_eq!(gas.rating(FoundationType::Cables), Some(Assessment::Lower));
    assert_eq!(assessment(Some(gas), FoundationType::Gbs), "No assessment available");
}

#[test]
fn comparison_fills_empty_lists_and_missing_text() {
    let repo = repo(MatchPolicy::Exact);
    let cmp = Comparison::build(&repo, "Shallow gas", "Sand");
    let gas = cmp.panels[0].details.as_ref().unwrap();
    let eng = &gas.constraints[1];
    assert_eq!(eng.domain, ConstraintDomain::Engineering);
    assert_eq!(eng.lines(), vec!["No engineering constraints identified"]);
    assert!(gas.references.is_empty());

    let json = serde_json::to_value(&cmp).unwrap();
    assert_eq!(json["panels"][1]["name"], "Sand");
    assert_eq!(json["panels"][1]["assessments"][0]["text"], "Lower Constraint");
}

#[test]
fn reconcile_reports_the_peat_mismatch() {
    let repo = repo(MatchPolicy::Exact);
    let r = reconcile(&repo, ConstraintDomain::Engineering);
    assert!(r.only_in_features.contains(&"Peat (organic-rich)".to_string()));
    assert!(r.only_in_features.contains(&"Shallow gas".to_string()));
    let peat = r
        .candidates
        .iter()
        .find(|c| c.feature == "Peat (organic-rich)")
        .unwrap();
    assert_eq!(peat.row.as_deref(), Some("Peat (organic-rich) / submerged forest"));

    let geo = reconcile(&repo, ConstraintDomain::Geological);
    assert_eq!(geo.matched, geo.features);
    assert!(geo.only_in_constraints.is_empty());
}

#[test]
fn default_selection_picks_first_two() {
    let names = repo(MatchPolicy::Exact).feature_names();
    let (a, b) = default_selection(&names);
    assert_eq!((a.as_str(), b.as_str()), ("Erratic or glaciotectonic raft", "Glauconite"));
    assert_eq!(
        default_selection(&[]),
        ("No features available".to_string(), "No features available".to_string())
    );
}

#[test]
fn shipped_config_matches_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../config/gam.yaml");
    let cfg = AppConfig::from_path(path).unwrap();
    let defaults = AppConfig::default();
    assert_eq!(cfg.match_policy, defaults.match_policy);
    assert_eq!(cfg.bind, defaults.bind);
    assert_eq!(cfg.geopackage, defaults.geopackage);
    assert_eq!(cfg.references, defaults.references);
}
