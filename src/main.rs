// Main entry point - Dependency injection and scheduler startup
use std::sync::Arc;

use sat_tracker::application::dashboard_service::DashboardService;
use sat_tracker::application::display_listener;
use sat_tracker::application::entity_registry::EntityRegistry;
use sat_tracker::application::events::EventBus;
use sat_tracker::application::refresh_scheduler::RefreshScheduler;
use sat_tracker::domain::time::MapInstant;
use sat_tracker::infrastructure::config::load_tracker_config;
use sat_tracker::infrastructure::dashboard_file::load_dashboard;
use sat_tracker::infrastructure::http_prediction_fetcher::HttpPredictionFetcher;
use sat_tracker::infrastructure::simulated_clock::SimulatedMapClock;
use sat_tracker::infrastructure::tracing_display_sink::TracingDisplaySink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sat_tracker=info".into()),
        )
        .init();

    // Load configuration
    let config = load_tracker_config()?;
    let policy = config.refresh.policy()?;
    let time_scale = config.clock.time_scale()?;
    let start = config
        .clock
        .start_instant()?
        .unwrap_or_else(|| MapInstant::new(chrono::Utc::now()));
    let dashboard = load_dashboard(&config.dashboard.path)?;

    // Create adapters (infrastructure layer)
    let fetcher = Arc::new(HttpPredictionFetcher::new(
        config.prediction_service.base_url.clone(),
    )?);
    let clock = Arc::new(SimulatedMapClock::new(start, time_scale));
    let sink = Arc::new(TracingDisplaySink::new());

    // Create services (application layer)
    let registry = Arc::new(EntityRegistry::new());
    let events = EventBus::default();
    let dashboards = DashboardService::new(registry.clone(), sink.clone(), events.clone());
    let scheduler = RefreshScheduler::new(
        registry.clone(),
        fetcher,
        clock,
        sink.clone(),
        events.clone(),
        policy,
    );
    let shutdown = scheduler.shutdown_token();

    let listener = tokio::spawn(display_listener::run(
        events.subscribe(),
        registry,
        sink,
        shutdown.clone(),
    ));
    dashboards.set_current_dashboard(dashboard);

    tracing::info!(
        prediction_service = %config.prediction_service.base_url,
        map_start = %start,
        rate_multiplier = time_scale.rate_multiplier(),
        "Starting satellite tracker"
    );

    let runner = tokio::spawn(async move { scheduler.run().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    shutdown.cancel();

    runner.await?;
    listener.await?;

    Ok(())
}
