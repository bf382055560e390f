pub mod api;
pub mod app;
pub mod chart;
pub mod climatology;
pub mod config;
pub mod dashboard;
pub mod fetch_error;
pub mod fetcher;
pub mod ghcn;
pub mod history_store;
pub mod page;
pub mod services;
pub mod stations;
