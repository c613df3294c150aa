// Domain layer - time, satellites, predictions and dashboards
pub mod coverage;
pub mod dashboard;
pub mod location;
pub mod prediction;
pub mod satellite;
pub mod style;
pub mod time;
