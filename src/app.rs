use axum::Router;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::fetcher::GhcnFetcher;
use crate::ghcn::StationFileParser;
use crate::history_store::HistoryStore;
use crate::services::{ClimateService, DashboardService};

/// Application with its HTTP server task
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

/// Wire services and router from configuration
///
/// When pre-loading is enabled every catalog station is downloaded before
/// the router is built, so the year dropdown is populated from the start.
pub async fn build_router(config: &Config) -> Result<Router, Box<dyn std::error::Error>> {
    let parser = StationFileParser::new(config.exclude_quality_flagged);
    let fetcher = GhcnFetcher::new(config.ghcn_base_url.clone(), config.fetch_timeout_secs)?
        .with_parser(parser);
    let store = HistoryStore::new(fetcher, config.cache_ttl_hours);
    let climate_service = ClimateService::new(config.catalog(), store);

    if config.preload_stations {
        info!("Pre-loading {} stations", config.stations.len());
        let loaded = climate_service.preload_all().await;
        if loaded == 0 {
            warn!("No station data could be loaded; charts will fetch on demand");
        }
    }

    let dashboard_service = DashboardService::new(climate_service.clone()).await;
    if let Err(e) = dashboard_service.initialize().await {
        warn!("Initial dashboard selection failed: {}", e);
    }

    let app_state = AppState {
        climate_service,
        dashboard_service,
    };
    Ok(create_router(app_state).layer(TraceLayer::new_for_http()))
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");
        let app = build_router(&config).await?;

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");
        Ok(Self { server_handle })
    }

    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
