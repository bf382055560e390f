use chrono::{Duration, Utc};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::fetch_error::FetchError;
use crate::fetcher::GhcnFetcher;
use crate::ghcn::StationHistory;
use crate::stations::Station;

/// In-memory cache of parsed station histories
///
/// Histories are replaced wholesale when they expire. A ttl of zero hours
/// keeps entries for the life of the process. At most one download per
/// station is in flight; concurrent callers wait for it and share the result.
#[derive(Clone)]
pub struct HistoryStore {
    fetcher: GhcnFetcher,
    ttl: Option<Duration>,
    entries: Arc<RwLock<HashMap<String, Arc<StationHistory>>>>,
    downloads: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl HistoryStore {
    pub fn new(fetcher: GhcnFetcher, ttl_hours: u64) -> Self {
        let ttl = (ttl_hours > 0).then(|| Duration::hours(ttl_hours as i64));
        Self {
            fetcher,
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
            downloads: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn is_fresh(&self, history: &StationHistory) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now() - history.fetched_at < ttl,
            None => true,
        }
    }

    pub async fn get(&self, station_id: &str) -> Option<Arc<StationHistory>> {
        self.entries.read().await.get(station_id).cloned()
    }

    pub async fn insert(&self, history: StationHistory) -> Arc<StationHistory> {
        let history = Arc::new(history);
        self.entries
            .write()
            .await
            .insert(history.station_id.clone(), history.clone());
        history
    }

    async fn fresh(&self, station_id: &str) -> Option<Arc<StationHistory>> {
        self.get(station_id)
            .await
            .filter(|history| self.is_fresh(history))
    }

    async fn download_lock(&self, station_id: &str) -> Arc<Mutex<()>> {
        self.downloads
            .lock()
            .await
            .entry(station_id.to_string())
            .or_default()
            .clone()
    }

    /// Cached history, downloading it when absent or expired
    #[instrument(skip(self))]
    pub async fn get_or_fetch(&self, station_id: &str) -> Result<Arc<StationHistory>, FetchError> {
        if let Some(history) = self.fresh(station_id).await {
            debug!("Cache hit for station {}", station_id);
            return Ok(history);
        }

        let lock = self.download_lock(station_id).await;
        let _download = lock.lock().await;

        // Another caller may have finished the download while we waited
        if let Some(history) = self.fresh(station_id).await {
            debug!("Station {} loaded by a concurrent request", station_id);
            return Ok(history);
        }

        if self.get(station_id).await.is_some() {
            info!("Cached history for station {} expired, refetching", station_id);
        }

        let history = self.fetcher.fetch_station(station_id).await?;
        Ok(self.insert(history).await)
    }

    /// Load every station concurrently; returns how many loaded
    ///
    /// Failures are logged and left for `get_or_fetch` to retry on demand.
    #[instrument(skip(self, stations), fields(stations = stations.len()))]
    pub async fn preload(&self, stations: &[Station]) -> usize {
        let results = join_all(stations.iter().map(|station| async move {
            (station, self.get_or_fetch(&station.station_id).await)
        }))
        .await;

        let mut loaded = 0;
        for (station, result) in results {
            match result {
                Ok(history) => {
                    loaded += 1;
                    info!(
                        "Loaded {} ({}): {} observations, {:?}..={:?}",
                        station.city,
                        station.station_id,
                        history.observations.len(),
                        history.first_year(),
                        history.last_year()
                    );
                }
                Err(e) => {
                    warn!(
                        "Failed to load data for {} ({}): {}",
                        station.city, station.station_id, e
                    );
                }
            }
        }

        info!("Pre-loaded {}/{} stations", loaded, stations.len());
        loaded
    }

    /// Sorted union of the years observed by all cached stations
    pub async fn available_years(&self) -> Vec<i32> {
        let entries = self.entries.read().await;
        let years: BTreeSet<i32> = entries.values().flat_map(|h| h.years()).collect();
        years.into_iter().collect()
    }
}
