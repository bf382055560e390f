// GHCN-Daily module
//
// Station files are published per station as CSV with one row per
// (date, element) pair. Only TMAX and TMIN are of interest here; they are
// pivoted into one DailyObservation per date.

pub mod station_file_parser;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeSet;

pub use station_file_parser::{GhcnParseError, StationFileParser};

/// Max/min temperature for one calendar date, in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub tmax: Option<f64>,
    pub tmin: Option<f64>,
}

/// Full parsed record of a single station
#[derive(Debug, Clone)]
pub struct StationHistory {
    pub station_id: String,
    /// Sorted by date, one entry per date
    pub observations: Vec<DailyObservation>,
    pub fetched_at: DateTime<Utc>,
}

impl StationHistory {
    pub fn new(station_id: impl Into<String>, mut observations: Vec<DailyObservation>) -> Self {
        observations.sort_by_key(|o| o.date);
        Self {
            station_id: station_id.into(),
            observations,
            fetched_at: Utc::now(),
        }
    }

    pub fn first_year(&self) -> Option<i32> {
        self.observations.first().map(|o| o.date.year())
    }

    pub fn last_year(&self) -> Option<i32> {
        self.observations.last().map(|o| o.date.year())
    }

    /// Distinct years with at least one observation
    pub fn years(&self) -> BTreeSet<i32> {
        self.observations.iter().map(|o| o.date.year()).collect()
    }
}
