// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use health_dashboard::application::clock::SystemClock;
use health_dashboard::application::dashboard_service::DashboardService;
use health_dashboard::application::range_controller::RangeController;
use health_dashboard::application::series_store::SeriesStore;
use health_dashboard::infrastructure::config::load_settings;
use health_dashboard::infrastructure::export_source::ExportFileSource;
use health_dashboard::presentation::app_state::AppState;
use health_dashboard::presentation::router::run;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = load_settings()?;
    let options = settings.engine.refresh_options()?;

    // Create sample source (infrastructure layer)
    let source = Arc::new(ExportFileSource::load(&settings.source.export_path, options.tz).await?);

    // Create controller and service (application layer)
    let controller = RangeController::new(
        source,
        SeriesStore::shared(),
        Arc::new(SystemClock),
        options,
        settings.engine.default_range,
    );
    let dashboard_service = DashboardService::new(Arc::new(controller));

    // Initial load for the default range
    match dashboard_service.refresh().await {
        Ok(handle) => dashboard_service.watch(handle),
        Err(e) => tracing::warn!("Initial refresh skipped: {}", e),
    }

    let state = Arc::new(AppState { dashboard_service });

    // Start server
    let addr: SocketAddr = settings.server.bind.parse()?;
    let (_, shutdown_tx) = run(addr, state).await?;

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());

    Ok(())
}
