pub mod climate_service;
pub mod dashboard_service;

pub use climate_service::{ClimateError, ClimateService, SelectionOptions};
pub use dashboard_service::DashboardService;
