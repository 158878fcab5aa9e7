use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use gam_core::logging::init_tracing;
use gam_core::{assessment, reconcile, render_text, AppConfig, Comparison, MatchPolicy, Repository};
use gam_store::gpkg::{build_geopackage, validate_geopackage};
use gam_store::{CsvDirSource, DataSource, FallbackSource, GeoPackageSource};
use gam_types::{sentinel, ConstraintDomain, FoundationType};
use tracing::debug;

#[derive(Parser)]
#[command(name = "gam", about = "Geo-assessment matrix lookups and data maintenance")]
struct Cli {
    /// YAML config file (defaults to $GAM_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    geopackage: Option<PathBuf>,
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,
    /// exact or fallback
    #[arg(long, global = true)]
    match_policy: Option<MatchPolicy>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List feature names.
    Features,
    /// Print every attribute of one feature.
    Show { name: String },
    /// Print one assessment label.
    Assess { name: String, foundation: FoundationType },
    /// Compare two features as a text report.
    Compare {
        first: String,
        second: String,
        #[arg(long)]
        json: bool,
    },
    /// Report feature names that do not line up with the constraint tables.
    Reconcile,
    /// Write the CSV tables into a GeoPackage.
    Build {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a GeoPackage for the expected metadata and tables.
    Validate { path: Option<PathBuf> },
}

fn main() -> anyhow::Result<()> {
    init_tracing("warn");
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.geopackage {
        config.geopackage = path;
    }
    if let Some(dir) = cli.csv_dir {
        config.csv_dir = dir;
    }
    if let Some(policy) = cli.match_policy {
        config.match_policy = policy;
    }

    match cli.command {
        Command::Build { out } => {
            let out = out.unwrap_or_else(|| config.geopackage.clone());
            let report = build_geopackage(&CsvDirSource::new(&config.csv_dir), &out)
                .with_context(|| format!("building {}", out.display()))?;
            for t in &report.tables {
                println!("{}: {} rows, {} columns", t.table, t.rows, t.columns);
            }
            for skipped in &report.skipped {
                println!("{skipped}: skipped (no source file)");
            }
            println!("wrote {}", out.display());
        }
        Command::Validate { path } => {
            let path = path.unwrap_or_else(|| config.geopackage.clone());
            let report = validate_geopackage(&path)?;
            let ok = |b: bool| if b { "ok" } else { "MISSING" };
            println!(
                "application_id: 0x{:08X} ({})",
                report.application_id,
                if report.application_id_ok() { "ok" } else { "not a GeoPackage" }
            );
            for (table, present) in &report.metadata_tables {
                println!("{table}: {}", ok(*present));
            }
            for (id, name) in &report.spatial_ref_sys {
                println!("  srs {id}: {name}");
            }
            for (table, data_type, identifier) in &report.contents {
                println!("  contents {table}: {data_type} ({})", identifier.as_deref().unwrap_or("-"));
            }
            for t in &report.data_tables {
                if t.present {
                    println!("{}: {} rows, {} columns", t.name, t.rows, t.columns);
                } else {
                    println!("{}: MISSING", t.name);
                }
            }
            if !report.is_compliant() {
                anyhow::bail!("{} is not a complete geo-assessment GeoPackage", path.display());
            }
        }
        command => {
            let source: Arc<dyn DataSource> = Arc::new(FallbackSource::new(
                Arc::new(GeoPackageSource::new(&config.geopackage)),
                Arc::new(CsvDirSource::new(&config.csv_dir)),
            ));
            let repo = Repository::load(source.as_ref(), config.repository_options());
            debug!(source = %repo.source(), notices = repo.notices().len(), "repository ready");
            run_lookup(&repo, command)?;
        }
    }

    Ok(())
}

fn run_lookup(repo: &Repository, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Features => {
            let names = repo.feature_names();
            if names.is_empty() {
                println!("{}", sentinel::NO_FEATURES);
            }
            for name in names {
                println!("{name}");
            }
        }
        Command::Show { name } => {
            let Some(record) = repo.resolve(&name) else {
                anyhow::bail!("feature {name:?} not found");
            };
            let field = |v: &Option<String>, placeholder: &str| {
                v.clone().unwrap_or_else(|| placeholder.to_string())
            };
            println!("{}", record.name);
            println!("  Setting: {}", field(&record.setting, sentinel::NOT_RECORDED));
            println!("  Process: {}", field(&record.process, sentinel::NOT_RECORDED));
            println!("  Constraint Type: {}", field(&record.constraint_type, sentinel::NOT_RECORDED));
            println!("  Dominant Constraint: {}", field(&record.dominant_constraint, sentinel::NOT_RECORDED));
            println!("  Definition: {}", field(&record.definition, sentinel::NO_DEFINITION));
            println!("  Comments: {}", field(&record.comments, sentinel::NO_COMMENTS));
            for f in FoundationType::ALL {
                println!("  {f}: {}", assessment(Some(record), f));
            }
            for domain in ConstraintDomain::ALL {
                let list = repo.constraints(&name, domain);
                println!("  {} constraints:", domain.label());
                if list.is_empty() {
                    println!("    {}", domain.none_identified());
                }
                for c in list {
                    println!("    - {c}");
                }
            }
        }
        Command::Assess { name, foundation } => {
            println!("{}", assessment(repo.resolve(&name), foundation));
        }
        Command::Compare { first, second, json } => {
            let comparison = Comparison::build(repo, &first, &second);
            if json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                print!("{}", render_text(&comparison, Utc::now()));
            }
        }
        Command::Reconcile => {
            for domain in ConstraintDomain::ALL {
                let r = reconcile(repo, domain);
                println!("{} constraints", domain.label());
                println!(
                    "  matched {}/{} feature names ({:.1}%)",
                    r.matched,
                    r.features,
                    r.match_rate()
                );
                for c in &r.candidates {
                    match &c.row {
                        Some(row) => println!("  only in features: {} (candidate: {row})", c.feature),
                        None => println!("  only in features: {}", c.feature),
                    }
                }
                for name in &r.only_in_constraints {
                    println!("  only in constraint table: {name}");
                }
            }
        }
        Command::Build { .. } | Command::Validate { .. } => {}
    }
    Ok(())
}
