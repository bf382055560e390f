/// Station catalog for the dashboard
///
/// Maps user-facing city names to the GHCN-Daily station that represents them.
/// The catalog is fixed for the life of the process; a city that is not in it
/// is a lookup failure rather than an empty chart.
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    pub city: String,
    pub station_id: String,
}

impl Station {
    pub fn new(city: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            station_id: station_id.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Unknown city: {0}")]
    UnknownCity(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StationListError {
    #[error("Expected 'City=STATIONID', got '{0}'")]
    MalformedEntry(String),
    #[error("Invalid GHCN station id '{0}'")]
    InvalidStationId(String),
    #[error("City '{0}' listed more than once")]
    DuplicateCity(String),
    #[error("Station list is empty")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    pub fn default_stations() -> Vec<Station> {
        vec![
            Station::new("Chicago, IL", "USW00094846"),
            Station::new("New York, NY", "USW00094728"),
            Station::new("Los Angeles, CA", "USW00093134"),
            Station::new("Miami, FL", "USW00012839"),
            Station::new("Denver, CO", "USW00023062"),
        ]
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// City names in the order the dropdown shows them
    pub fn cities(&self) -> Vec<String> {
        let mut cities: Vec<String> = self.stations.iter().map(|s| s.city.clone()).collect();
        cities.sort();
        cities
    }

    pub fn lookup(&self, city: &str) -> Result<&Station, LookupError> {
        self.stations
            .iter()
            .find(|s| s.city == city)
            .ok_or_else(|| LookupError::UnknownCity(city.to_string()))
    }
}

impl Default for StationCatalog {
    fn default() -> Self {
        Self::new(Self::default_stations())
    }
}

fn station_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Two-letter country code, network code, eight-character station number
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{9}$").expect("valid station id regex"))
}

pub fn is_valid_station_id(value: &str) -> bool {
    station_id_pattern().is_match(value)
}

/// Trim and uppercase a user-supplied station id, rejecting malformed ones
pub fn normalize_station_id(value: &str) -> Result<String, StationListError> {
    let station_id = value.trim().to_ascii_uppercase();
    if is_valid_station_id(&station_id) {
        Ok(station_id)
    } else {
        Err(StationListError::InvalidStationId(station_id))
    }
}

/// Parse a `City=STATIONID;City=STATIONID` station list
///
/// # Examples
///
/// ```
/// use weather_dashboard::stations::parse_station_list;
///
/// let stations = parse_station_list("Chicago, IL=USW00094846; Boston, MA=USW00014739").unwrap();
/// assert_eq!(stations.len(), 2);
/// assert_eq!(stations[1].city, "Boston, MA");
/// assert_eq!(stations[1].station_id, "USW00014739");
/// ```
pub fn parse_station_list(value: &str) -> Result<Vec<Station>, StationListError> {
    let mut stations: Vec<Station> = Vec::new();

    for entry in value.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (city, station_id) = entry
            .rsplit_once('=')
            .ok_or_else(|| StationListError::MalformedEntry(entry.to_string()))?;
        let city = city.trim();
        if city.is_empty() {
            return Err(StationListError::MalformedEntry(entry.to_string()));
        }
        let station_id = normalize_station_id(station_id)?;
        if stations.iter().any(|s| s.city == city) {
            return Err(StationListError::DuplicateCity(city.to_string()));
        }

        stations.push(Station::new(city, station_id));
    }

    if stations.is_empty() {
        return Err(StationListError::Empty);
    }

    Ok(stations)
}
