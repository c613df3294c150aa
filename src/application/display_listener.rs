// Keeps the display in step with dashboard switches
use crate::application::display_sink::DisplaySink;
use crate::application::entity_registry::EntityRegistry;
use crate::application::events::TrackerEvent;
use crate::domain::dashboard::Dashboard;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

/// React to `DashboardChanged` by clearing the map, drawing the dashboard's locations and
/// redrawing whatever satellites already have predictions. Runs until cancelled or until the
/// event bus goes away.
pub async fn run(
    mut events: broadcast::Receiver<TrackerEvent>,
    registry: Arc<EntityRegistry>,
    sink: Arc<dyn DisplaySink>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(TrackerEvent::DashboardChanged(dashboard)) => {
                redraw(&dashboard, &registry, sink.as_ref());
            }
            Ok(TrackerEvent::PredictionUpdated { entity_id, window }) => {
                tracing::trace!(entity_id = %entity_id, window = %window, "Prediction updated");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Display listener fell behind on events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn redraw(dashboard: &Dashboard, registry: &EntityRegistry, sink: &dyn DisplaySink) {
    sink.clear_all();
    sink.show_locations(&dashboard.locations);

    // a fetch may have landed between the registry swap and this event
    for entity in registry.list() {
        if entity.coverage.is_some() {
            sink.update(entity.id(), Arc::clone(&entity.samples), &entity.satellite.style);
        }
    }
}
