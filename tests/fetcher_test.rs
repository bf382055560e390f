// Tests for GhcnFetcher against a mocked by-station endpoint

mod common;

use common::{date, ghcn_csv};
use mockito::Server;
use weather_dashboard::fetch_error::FetchError;
use weather_dashboard::fetcher::GhcnFetcher;
use weather_dashboard::ghcn::{GhcnParseError, StationFileParser};
use weather_dashboard::history_store::HistoryStore;

const STATION: &str = "USW00023062";

fn create_test_fetcher(base_url: String) -> GhcnFetcher {
    GhcnFetcher::new(base_url, 10).unwrap()
}

#[tokio::test]
async fn test_fetch_station_success() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/USW00023062.csv")
        .with_status(200)
        .with_header("content-type", "text/csv")
        .with_body(ghcn_csv(STATION, date(2020, 1, 1), date(2020, 12, 31)))
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let history = fetcher.fetch_station(STATION).await.unwrap();

    assert_eq!(history.station_id, STATION);
    assert_eq!(history.observations.len(), 366);
    assert_eq!(history.first_year(), Some(2020));
    assert_eq!(history.last_year(), Some(2020));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_station_404() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/USW00099999.csv")
        .with_status(404)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_station("USW00099999").await;

    match result.unwrap_err() {
        FetchError::NotFound(msg) => {
            assert!(msg.contains("USW00099999.csv"));
            assert!(msg.contains("not found"));
        }
        e => panic!("Expected NotFound error, got: {e:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_station_server_error() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/USW00023062.csv")
        .with_status(503)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_station(STATION).await;

    match result.unwrap_err() {
        FetchError::ServerError(msg) => {
            assert!(msg.contains("503"));
            assert!(msg.contains("USW00023062.csv"));
        }
        e => panic!("Expected ServerError, got: {e:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_station_forbidden_is_request_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/USW00023062.csv")
        .with_status(403)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_station(STATION).await;

    assert!(matches!(result, Err(FetchError::Request(_))));
}

#[tokio::test]
async fn test_fetch_station_without_temperatures_is_parse_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/USW00023062.csv")
        .with_status(200)
        .with_body("ID,DATE,ELEMENT,DATA_VALUE\nUSW00023062,20200101,PRCP,5\n")
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_station(STATION).await;

    assert!(matches!(
        result,
        Err(FetchError::Parse(GhcnParseError::NoTemperatureData))
    ));
}

#[tokio::test]
async fn test_fetch_station_with_quality_filter() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/USW00023062.csv")
        .with_status(200)
        .with_body(
            "ID,DATE,ELEMENT,DATA_VALUE,M_FLAG,Q_FLAG,S_FLAG,OBS_TIME\n\
             USW00023062,20200101,TMAX,555,,G,W,\n\
             USW00023062,20200101,TMIN,-20,,,W,\n",
        )
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url()).with_parser(StationFileParser::new(true));
    let history = fetcher.fetch_station(STATION).await.unwrap();

    assert_eq!(history.observations[0].tmax, None);
    assert_eq!(history.observations[0].tmin, Some(-2.0));
}

#[tokio::test]
async fn test_history_store_fetches_once() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/USW00023062.csv")
        .with_status(200)
        .with_body(ghcn_csv(STATION, date(2021, 1, 1), date(2021, 1, 31)))
        .expect(1)
        .create_async()
        .await;

    let store = HistoryStore::new(create_test_fetcher(server.url()), 24);
    let first = store.get_or_fetch(STATION).await.unwrap();
    let second = store.get_or_fetch(STATION).await.unwrap();

    assert_eq!(first.observations.len(), 31);
    assert_eq!(second.observations.len(), 31);
    assert_eq!(store.available_years().await, vec![2021]);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_history_store_shares_concurrent_download() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/USW00023062.csv")
        .with_status(200)
        .with_body(ghcn_csv(STATION, date(2021, 1, 1), date(2021, 3, 31)))
        .expect(1)
        .create_async()
        .await;

    let store = HistoryStore::new(create_test_fetcher(server.url()), 24);
    let (first, second) = tokio::join!(
        store.get_or_fetch(STATION),
        store.get_or_fetch(STATION)
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.observations.len(), 90);
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    mock.assert_async().await;
}

#[test]
fn test_error_display() {
    let err = FetchError::NotFound("USW00023062.csv not found on server".to_string());
    assert!(err.to_string().contains("404"));
    assert!(err.to_string().contains("USW00023062.csv"));

    let err = FetchError::ServerError("Server error 500".to_string());
    assert!(err.to_string().contains("5xx"));
}
