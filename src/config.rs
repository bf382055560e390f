use std::env;

use crate::stations::{parse_station_list, Station, StationCatalog, StationListError};

pub const DEFAULT_GHCN_BASE_URL: &str = "https://noaa-ghcn-pds.s3.amazonaws.com/csv/by_station";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Invalid STATIONS override: {0}")]
    Stations(#[from] StationListError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub ghcn_base_url: String,
    pub fetch_timeout_secs: u64,
    pub cache_ttl_hours: u64,
    pub exclude_quality_flagged: bool,
    pub preload_stations: bool,
    pub stations: Vec<Station>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let stations = match env::var("STATIONS") {
            Ok(list) if !list.trim().is_empty() => parse_station_list(&list)?,
            _ => StationCatalog::default_stations(),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            ghcn_base_url: env::var("GHCN_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GHCN_BASE_URL.to_string()),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            cache_ttl_hours: env::var("CACHE_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
            exclude_quality_flagged: parse_flag("EXCLUDE_QUALITY_FLAGGED", false)?,
            preload_stations: parse_flag("PRELOAD_STATIONS", true)?,
            stations,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn catalog(&self) -> StationCatalog {
        StationCatalog::new(self.stations.clone())
    }
}

fn parse_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { name, value }),
        },
    }
}
