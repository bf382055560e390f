use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::fetch_error::FetchError;
use crate::ghcn::{StationFileParser, StationHistory};

/// Downloads GHCN-Daily by-station CSV files
#[derive(Clone)]
pub struct GhcnFetcher {
    client: reqwest::Client,
    base_url: String,
    parser: StationFileParser,
}

impl GhcnFetcher {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            parser: StationFileParser::default(),
        })
    }

    pub fn with_parser(mut self, parser: StationFileParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn station_url(&self, station_id: &str) -> String {
        format!("{}/{}.csv", self.base_url, station_id)
    }

    /// Download and parse the full history of one station
    #[instrument(skip(self))]
    pub async fn fetch_station(&self, station_id: &str) -> Result<StationHistory, FetchError> {
        let text = self.download_station_file(station_id).await?;
        let observations = self.parser.parse(&text)?;
        info!(
            "Fetched {} daily observations for station {}",
            observations.len(),
            station_id
        );
        Ok(StationHistory::new(station_id, observations))
    }

    async fn download_station_file(&self, station_id: &str) -> Result<String, FetchError> {
        let url = self.station_url(station_id);
        debug!("Sending HTTP request to {}", url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        debug!("Received HTTP response with status: {}", status);

        if status.is_success() {
            let text = response.text().await?;
            debug!("Downloaded {}.csv ({} bytes)", station_id, text.len());
            Ok(text)
        } else if status.as_u16() == 404 {
            Err(FetchError::NotFound(format!("{station_id}.csv not found on server")))
        } else if status.is_server_error() {
            Err(FetchError::ServerError(format!(
                "Server error {status} while downloading {station_id}.csv"
            )))
        } else {
            match response.error_for_status() {
                Err(e) => Err(FetchError::Request(e)),
                Ok(_) => Err(FetchError::UnexpectedStatus(format!(
                    "Status {status} while downloading {station_id}.csv"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_url_trims_trailing_slash() {
        let fetcher = GhcnFetcher::new("https://example.com/csv/by_station/".to_string(), 5).unwrap();
        assert_eq!(
            fetcher.station_url("USW00094846"),
            "https://example.com/csv/by_station/USW00094846.csv"
        );
    }
}
