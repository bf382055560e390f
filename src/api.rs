use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::chart::ChartLayers;
use crate::climatology::{DailyAggregate, DailyAggregateRow};
use crate::dashboard::{ColumnDataSource, DashboardSnapshot, Selection, SelectionChange};
use crate::page::render_dashboard_page;
use crate::services::{ClimateError, ClimateService, DashboardService, SelectionOptions};

#[derive(Clone)]
pub struct AppState {
    pub climate_service: ClimateService,
    pub dashboard_service: DashboardService,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Lookup failures are 404, retrieval failures 502
pub struct ApiError(ClimateError);

impl From<ClimateError> for ApiError {
    fn from(e: ClimateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ClimateError::Lookup(_) => StatusCode::NOT_FOUND,
            ClimateError::Retrieval(_) => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_options, get_dashboard, get_dashboard_chart, post_selection, get_climate),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        SelectionOptions,
        Selection,
        SelectionChange,
        ColumnDataSource,
        DashboardSnapshot,
        DailyAggregate,
        DailyAggregateRow
    )),
    info(title = "Weather Dashboard API", description = "Daily temperature records, 1981-2010 normals and actuals per city")
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/options", get(get_options))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/chart", get(get_dashboard_chart))
        .route("/dashboard/selection", post(post_selection))
        .route("/climate/{city}/{year}", get(get_climate))
        .with_state(state.clone());

    Router::new()
        .route("/", get(index))
        .with_state(state)
        .nest("/api/v1", api_routes)
}

#[instrument(skip(state))]
async fn index(State(state): State<AppState>) -> Html<String> {
    let options = state.climate_service.options().await;
    let snapshot = state.dashboard_service.snapshot().await;
    debug!("Rendering dashboard page for {:?}", snapshot.selection);
    Html(render_dashboard_page(&options, &snapshot))
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/options",
    responses((status = 200, description = "City and year dropdown values", body = SelectionOptions))
)]
#[instrument(skip(state))]
async fn get_options(State(state): State<AppState>) -> Json<SelectionOptions> {
    let options = state.climate_service.options().await;
    debug!(
        "Returning {} cities and {} years",
        options.cities.len(),
        options.years.len()
    );
    Json(options)
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses((status = 200, description = "Current selection and bound table", body = DashboardSnapshot))
)]
#[instrument(skip(state))]
async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard_service.snapshot().await)
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/chart",
    params(ChartLayers),
    responses(
        (status = 200, description = "Current chart as SVG", content_type = "image/svg+xml", body = String),
        (status = 500, description = "Chart could not be drawn", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn get_dashboard_chart(
    State(state): State<AppState>,
    Query(layers): Query<ChartLayers>,
) -> Response {
    match state.dashboard_service.chart(layers).await {
        Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => {
            error!("Failed to draw chart: {}", e);
            let body = ErrorResponse {
                error: e.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/dashboard/selection",
    request_body = SelectionChange,
    responses(
        (status = 200, description = "Selection applied, table replaced", body = DashboardSnapshot),
        (status = 404, description = "Unknown city", body = ErrorResponse),
        (status = 502, description = "Station data could not be retrieved", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn post_selection(
    State(state): State<AppState>,
    Json(change): Json<SelectionChange>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    debug!("Selection change requested: {:?}", change);
    let snapshot = state.dashboard_service.select(change).await.map_err(|e| {
        error!("Failed to apply selection: {}", e);
        ApiError::from(e)
    })?;

    info!("Dashboard now shows {}", snapshot.title);
    Ok(Json(snapshot))
}

#[utoipa::path(
    get,
    path = "/api/v1/climate/{city}/{year}",
    params(
        ("city" = String, Path, description = "City name as listed in /options"),
        ("year" = i32, Path, description = "Year for the actual series")
    ),
    responses(
        (status = 200, description = "366-row daily aggregate", body = DailyAggregate),
        (status = 404, description = "Unknown city", body = ErrorResponse),
        (status = 502, description = "Station data could not be retrieved", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(city = %city, year = %year))]
async fn get_climate(
    State(state): State<AppState>,
    Path((city, year)): Path<(String, i32)>,
) -> Result<Json<DailyAggregate>, ApiError> {
    debug!("Computing daily aggregate for {} {}", city, year);
    let aggregate = state
        .climate_service
        .daily_aggregate(&city, year)
        .await
        .map_err(|e| {
            match &e {
                ClimateError::Lookup(_) => warn!("Unknown city requested: {}", city),
                ClimateError::Retrieval(_) => error!("Failed to retrieve data for {}: {}", city, e),
            }
            ApiError::from(e)
        })?;

    info!(
        "Computed {} rows for station {} year {}",
        aggregate.rows.len(),
        aggregate.station_id,
        year
    );
    Ok(Json(aggregate))
}
