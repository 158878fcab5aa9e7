use std::net::SocketAddr;
use std::sync::Arc;

use gam_core::logging::init_tracing;
use gam_core::{AppConfig, Repository};
use gam_http::{router, AppState};
use gam_store::{CsvDirSource, DataSource, FallbackSource, GeoPackageSource};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,tower_http=debug");

    let config = AppConfig::load(None)?;

    // GeoPackage first, CSV directory for any table it lacks.
    let source: Arc<dyn DataSource> = Arc::new(FallbackSource::new(
        Arc::new(GeoPackageSource::new(&config.geopackage)),
        Arc::new(CsvDirSource::new(&config.csv_dir)),
    ));
    let repo = Repository::load(source.as_ref(), config.repository_options());
    for notice in repo.notices() {
        warn!(table = %notice.table, "{}", notice.message);
    }

    let app = router(AppState::new(repo, config.references.clone()));

    let addr: SocketAddr = config.bind.parse()?;
    info!(%addr, policy = %config.match_policy, "geo-assessment matrix listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
