// Publish/subscribe for tracker events
use crate::domain::coverage::CoverageWindow;
use crate::domain::dashboard::Dashboard;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum TrackerEvent {
    DashboardChanged(Arc<Dashboard>),
    PredictionUpdated { entity_id: Uuid, window: CoverageWindow },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TrackerEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: TrackerEvent) {
        // no subscribers is fine
        let _ = self.sender.send(event);
    }
}
