use serde::Serialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::climatology::{compute_daily_aggregate, DailyAggregate};
use crate::fetch_error::FetchError;
use crate::history_store::HistoryStore;
use crate::stations::{LookupError, StationCatalog};

#[derive(Debug, thiserror::Error)]
pub enum ClimateError {
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] FetchError),
}

/// Values the two dashboard dropdowns offer
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SelectionOptions {
    pub cities: Vec<String>,
    pub years: Vec<i32>,
}

#[derive(Clone)]
pub struct ClimateService {
    catalog: StationCatalog,
    store: HistoryStore,
}

impl ClimateService {
    pub fn new(catalog: StationCatalog, store: HistoryStore) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Daily aggregate for a city and year
    ///
    /// A year the station never observed is not an error: the table comes
    /// back with every actual value absent.
    #[instrument(skip(self))]
    pub async fn daily_aggregate(&self, city: &str, year: i32) -> Result<DailyAggregate, ClimateError> {
        let station = self.catalog.lookup(city)?;
        debug!("Resolved {} to station {}", city, station.station_id);

        let history = self.store.get_or_fetch(&station.station_id).await?;
        let aggregate = compute_daily_aggregate(&history, year);

        if !aggregate.has_actuals() {
            info!("Station {} has no observations for {}", station.station_id, year);
        }

        Ok(aggregate)
    }

    pub async fn options(&self) -> SelectionOptions {
        SelectionOptions {
            cities: self.catalog.cities(),
            years: self.store.available_years().await,
        }
    }

    pub async fn preload_all(&self) -> usize {
        self.store.preload(self.catalog.stations()).await
    }
}
