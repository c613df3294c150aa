// Application layer - Coverage scheduling, registry and capability traits
pub mod dashboard_service;
pub mod display_listener;
pub mod display_sink;
pub mod entity_registry;
pub mod events;
pub mod map_clock;
pub mod prediction_fetcher;
pub mod refresh_scheduler;

#[cfg(test)]
pub(crate) mod test_support;
