use chrono::{Datelike, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::chart::{ChartError, ChartLayers};
use crate::dashboard::{Dashboard, DashboardSnapshot, SelectionChange};
use crate::services::climate_service::{ClimateError, ClimateService};

/// Owns the dashboard's current selection and bound table
///
/// Selection changes queue on `writer` and recompute without touching the
/// state lock, which is only taken to read the selection and to swap the new
/// table in. Readers never wait on a download.
#[derive(Clone)]
pub struct DashboardService {
    climate: ClimateService,
    dashboard: Arc<Mutex<Dashboard>>,
    writer: Arc<Mutex<()>>,
}

impl DashboardService {
    pub async fn new(climate: ClimateService) -> Self {
        let options = climate.options().await;
        let dashboard = Dashboard::new(&options, Utc::now().year());
        Self {
            climate,
            dashboard: Arc::new(Mutex::new(dashboard)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Bind the default selection
    pub async fn initialize(&self) -> Result<DashboardSnapshot, ClimateError> {
        self.select(SelectionChange::default()).await
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.dashboard.lock().await.snapshot()
    }

    /// Current chart with only the requested series drawn
    pub async fn chart(&self, layers: ChartLayers) -> Result<String, ChartError> {
        self.dashboard.lock().await.render_chart(layers)
    }

    #[instrument(skip(self))]
    pub async fn select(&self, change: SelectionChange) -> Result<DashboardSnapshot, ClimateError> {
        let _writer = self.writer.lock().await;
        let selection = self.dashboard.lock().await.selection().with_change(&change);
        debug!("Recomputing for {} {}", selection.city, selection.year);

        let result = self
            .climate
            .daily_aggregate(&selection.city, selection.year)
            .await;

        let mut dashboard = self.dashboard.lock().await;
        match result {
            Ok(aggregate) => {
                info!("Bound {} rows for {} {}", aggregate.rows.len(), selection.city, selection.year);
                dashboard.bind(selection, &aggregate);
                Ok(dashboard.snapshot())
            }
            Err(e) => {
                warn!("Selection {} {} failed: {}", selection.city, selection.year, e);
                dashboard.fail(e.to_string());
                Err(e)
            }
        }
    }
}
