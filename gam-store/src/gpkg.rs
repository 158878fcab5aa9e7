//! GeoPackage maintenance: write the CSV tables into a GeoPackage and check its compliance.

use std::collections::HashSet;
use std::path::Path;

use arrow_array::{Array, StringArray};
use arrow_schema::DataType;
use gam_types::TableKind;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{info, warn};

use crate::geopackage::{quote_ident, table_exists};
use crate::{DataError, DataSource, TableBatch};

/// `PRAGMA application_id` of a GeoPackage ("GP10").
pub const GPKG_APPLICATION_ID: i32 = 0x4750_3130;
/// `PRAGMA user_version` for GeoPackage 1.2.
pub const GPKG_USER_VERSION: i32 = 10200;

const METADATA_TABLES: [&str; 2] = ["gpkg_spatial_ref_sys", "gpkg_contents"];

const CREATE_SRS: &str = "CREATE TABLE IF NOT EXISTS gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
)";

const CREATE_CONTENTS: &str = "CREATE TABLE IF NOT EXISTS gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER
)";

const WGS84_WKT: &str = "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]]";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSummary {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Clone, Debug, Default)]
pub struct BuildReport {
    pub tables: Vec<TableSummary>,
    /// Optional tables the source did not have.
    pub skipped: Vec<String>,
}

/// Write every table of `source` into the GeoPackage at `out`, replacing existing tables.
///
/// Required tables must load; optional tables are skipped when missing. The
/// whole build runs in one transaction.
pub fn build_geopackage(source: &dyn DataSource, out: &Path) -> Result<BuildReport, DataError> {
    let mut loaded = Vec::new();
    let mut report = BuildReport::default();
    for table in TableKind::ALL {
        match source.load(table) {
            Ok(batch) => loaded.push((table, batch)),
            Err(e) if e.is_missing() && table.is_optional() => {
                report.skipped.push(table.table_name().to_string());
            }
            Err(e) => return Err(e),
        }
    }

    let location = out.display().to_string();
    let db_err = |source| DataError::Database {
        location: location.clone(),
        source,
    };

    let mut conn = Connection::open(out).map_err(db_err)?;
    conn.execute_batch(&format!(
        "PRAGMA application_id = {GPKG_APPLICATION_ID}; PRAGMA user_version = {GPKG_USER_VERSION};"
    ))
    .map_err(db_err)?;

    let tx = conn.transaction().map_err(db_err)?;
    tx.execute_batch(CREATE_SRS).map_err(db_err)?;
    tx.execute_batch(CREATE_CONTENTS).map_err(db_err)?;
    seed_spatial_ref_sys(&tx).map_err(db_err)?;

    for (table, batch) in &loaded {
        let summary = write_table(&tx, table.table_name(), batch).map_err(db_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO gpkg_contents (table_name, data_type, identifier, description, last_change)
             VALUES (?1, 'attributes', ?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ','now'))",
            params![table.table_name(), contents_description(table.table_name())],
        )
        .map_err(db_err)?;
        info!(table = %summary.table, rows = summary.rows, columns = summary.columns, "wrote table");
        report.tables.push(summary);
    }
    tx.commit().map_err(db_err)?;

    Ok(report)
}

fn seed_spatial_ref_sys(conn: &Connection) -> rusqlite::Result<()> {
    let rows: [(&str, i64, &str, i64, &str, &str); 3] = [
        ("Undefined cartesian SRS", -1, "NONE", -1, "undefined", "undefined cartesian coordinate reference system"),
        ("Undefined geographic SRS", 0, "NONE", 0, "undefined", "undefined geographic coordinate reference system"),
        ("WGS 84 geodetic", 4326, "EPSG", 4326, WGS84_WKT, "longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid"),
    ];
    for (name, id, org, org_id, definition, description) in rows {
        conn.execute(
            "INSERT OR IGNORE INTO gpkg_spatial_ref_sys
             (srs_name, srs_id, organization, organization_coordsys_id, definition, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![name, id, org, org_id, definition, description],
        )?;
    }
    Ok(())
}

fn write_table(conn: &Connection, name: &str, batch: &TableBatch) -> rusqlite::Result<TableSummary> {
    let schema = batch.schema();
    let mut names = Vec::new();
    let mut columns: Vec<&StringArray> = Vec::new();
    for (i, field) in schema.fields().iter().enumerate() {
        let text = match field.data_type() {
            DataType::Utf8 => batch.column(i).as_any().downcast_ref::<StringArray>(),
            _ => None,
        };
        match text {
            Some(array) => {
                names.push(field.name().as_str());
                columns.push(array);
            }
            None => warn!(table = name, column = %field.name(), "skipping non-text column"),
        }
    }
    let headers = unique_headers(names.into_iter());

    let ident = quote_ident(name);
    let defs: Vec<String> = headers
        .iter()
        .map(|h| format!("{} TEXT", quote_ident(h)))
        .collect();
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {ident}; CREATE TABLE {ident} ({});",
        defs.join(", ")
    ))?;

    let placeholders = vec!["?"; columns.len()].join(", ");
    let mut insert = conn.prepare(&format!("INSERT INTO {ident} VALUES ({placeholders})"))?;
    for row in 0..batch.num_rows() {
        let cells = columns
            .iter()
            .map(|a| (!a.is_null(row)).then(|| a.value(row)));
        insert.execute(params_from_iter(cells))?;
    }

    Ok(TableSummary {
        table: name.to_string(),
        rows: batch.num_rows(),
        columns: columns.len(),
    })
}

/// SQLite rejects duplicate column names; repeated headers get a `.N` suffix.
fn unique_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .map(|h| {
            let base = if h.is_empty() { "column" } else { h };
            let mut candidate = base.to_string();
            let mut n = 1;
            while !seen.insert(candidate.to_lowercase()) {
                candidate = format!("{base}.{n}");
                n += 1;
            }
            candidate
        })
        .collect()
}

/// `geological_features` -> `EGDI Geological Features`.
fn contents_description(table: &str) -> String {
    let title: Vec<String> = table
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    format!("EGDI {}", title.join(" "))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableCheck {
    pub name: String,
    pub present: bool,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Clone, Debug)]
pub struct ValidationReport {
    pub application_id: i32,
    pub metadata_tables: Vec<(String, bool)>,
    pub spatial_ref_sys: Vec<(i64, String)>,
    /// (table_name, data_type, identifier) from `gpkg_contents`.
    pub contents: Vec<(String, String, Option<String>)>,
    pub data_tables: Vec<TableCheck>,
}

impl ValidationReport {
    pub fn application_id_ok(&self) -> bool {
        self.application_id == GPKG_APPLICATION_ID
    }

    pub fn is_compliant(&self) -> bool {
        self.application_id_ok()
            && self.metadata_tables.iter().all(|(_, present)| *present)
            && self.data_tables.iter().all(|t| t.present)
    }
}

/// Inspect a GeoPackage without modifying it.
pub fn validate_geopackage(path: &Path) -> Result<ValidationReport, DataError> {
    let location = path.display().to_string();
    if !path.exists() {
        return Err(DataError::SourceMissing {
            table: TableKind::Features,
            location,
        });
    }
    let db_err = |source| DataError::Database {
        location: location.clone(),
        source,
    };
    let conn = Connection::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(db_err)?;

    let application_id: i32 = conn
        .query_row("PRAGMA application_id", [], |r| r.get(0))
        .map_err(db_err)?;

    let mut metadata_tables = Vec::new();
    for name in METADATA_TABLES {
        metadata_tables.push((name.to_string(), table_exists(&conn, name).map_err(db_err)?));
    }

    let mut spatial_ref_sys = Vec::new();
    if table_exists(&conn, "gpkg_spatial_ref_sys").map_err(db_err)? {
        let mut stmt = conn
            .prepare("SELECT srs_id, srs_name FROM gpkg_spatial_ref_sys ORDER BY srs_id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))
            .map_err(db_err)?;
        for row in rows {
            spatial_ref_sys.push(row.map_err(db_err)?);
        }
    }

    let mut contents = Vec::new();
    if table_exists(&conn, "gpkg_contents").map_err(db_err)? {
        let mut stmt = conn
            .prepare("SELECT table_name, data_type, identifier FROM gpkg_contents ORDER BY table_name")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, Option<String>>(2)?,
                ))
            })
            .map_err(db_err)?;
        for row in rows {
            contents.push(row.map_err(db_err)?);
        }
    }

    let mut data_tables = Vec::new();
    for table in TableKind::REQUIRED {
        data_tables.push(check_table(&conn, table.table_name()).map_err(db_err)?);
    }

    Ok(ValidationReport {
        application_id,
        metadata_tables,
        spatial_ref_sys,
        contents,
        data_tables,
    })
}

fn check_table(conn: &Connection, name: &str) -> rusqlite::Result<TableCheck> {
    if !table_exists(conn, name)? {
        return Ok(TableCheck {
            name: name.to_string(),
            present: false,
            rows: 0,
            columns: 0,
        });
    }
    let ident = quote_ident(name);
    let rows: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {ident}"), [], |r| r.get(0))?;
    let columns: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1)",
            [name],
            |r| r.get(0),
        )
        .optional()?
        .unwrap_or(0);
    Ok(TableCheck {
        name: name.to_string(),
        present: true,
        rows: rows.max(0) as usize,
        columns: columns.max(0) as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeoPackageSource, InMemorySource};

    #[test]
    fn descriptions_are_title_cased() {
        assert_eq!(contents_description("geological_features"), "EGDI Geological Features");
        assert_eq!(contents_description("comment_overrides"), "EGDI Comment Overrides");
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let h = unique_headers(["Unknown", "Setting", "unknown", "Unknown", ""].into_iter());
        assert_eq!(h, vec!["Unknown", "Setting", "unknown.1", "Unknown.2", "column"]);
    }

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_csv(
                TableKind::Features,
                "Geological_Feature,Piles_Assessment\nSand,Lower Constraint\nGravel,\n",
            )
            .unwrap()
            .with_csv(
                TableKind::GeologicalConstraints,
                "Geological feature inventory,Setting,Process,Definition,Unknown,Coarse soil units\nSand,,,,x,x\n",
            )
            .unwrap()
            .with_csv(
                TableKind::EngineeringConstraints,
                "Geological feature inventory,Setting,Process,Definition,Unknown,unknown\nSand,,,,x,\n",
            )
            .unwrap()
    }

    #[test]
    fn built_package_validates_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("matrix.gpkg");

        let report = build_geopackage(&source(), &out).unwrap();
        assert_eq!(report.tables.len(), 3);
        assert_eq!(report.skipped, vec!["comment_overrides".to_string()]);

        let check = validate_geopackage(&out).unwrap();
        assert!(check.is_compliant());
        let srs: Vec<i64> = check.spatial_ref_sys.iter().map(|(id, _)| *id).collect();
        assert_eq!(srs, vec![-1, 0, 4326]);
        assert!(check
            .contents
            .iter()
            .all(|(_, data_type, _)| data_type == "attributes"));
        let eng = check
            .data_tables
            .iter()
            .find(|t| t.name == "engineering_constraints")
            .unwrap();
        assert_eq!((eng.rows, eng.columns), (1, 6));

        let features = GeoPackageSource::new(&out).load(TableKind::Features).unwrap();
        assert_eq!(features.num_rows(), 2);
        let piles = features.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(piles.value(0), "Lower Constraint");
        assert!(piles.is_null(1));
    }

    #[test]
    fn rebuilding_replaces_tables() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("matrix.gpkg");
        build_geopackage(&source(), &out).unwrap();
        build_geopackage(&source(), &out).unwrap();
        let check = validate_geopackage(&out).unwrap();
        let features = check
            .data_tables
            .iter()
            .find(|t| t.name == "geological_features")
            .unwrap();
        assert_eq!(features.rows, 2);
        assert_eq!(check.contents.len(), 3);
    }

    #[test]
    fn missing_required_table_aborts_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("matrix.gpkg");
        let src = InMemorySource::new()
            .with_csv(TableKind::Features, "Geological_Feature\nSand\n")
            .unwrap();
        assert!(build_geopackage(&src, &out).unwrap_err().is_missing());
    }

    #[test]
    fn plain_sqlite_file_is_not_compliant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE geological_features (Geological_Feature TEXT);")
            .unwrap();
        let check = validate_geopackage(&path).unwrap();
        assert!(!check.application_id_ok());
        assert!(!check.is_compliant());
        assert!(check.data_tables.iter().any(|t| !t.present));
    }
}
