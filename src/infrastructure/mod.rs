// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod dashboard_file;
pub mod http_prediction_fetcher;
pub mod simulated_clock;
pub mod tracing_display_sink;
