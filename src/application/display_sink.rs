// Capability trait for whatever renders the map
use crate::domain::location::Location;
use crate::domain::prediction::PositionSample;
use crate::domain::style::StyleConfig;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityFlag {
    Paths,
    Sensors,
    NightShadow,
}

/// Receives finished display data. Calls are fire-and-forget; implementations must not block.
pub trait DisplaySink: Send + Sync {
    /// Replace everything shown for `entity_id`. Last write wins.
    fn update(&self, entity_id: Uuid, samples: Arc<[PositionSample]>, style: &StyleConfig);

    fn clear_all(&self);

    fn set_visibility(&self, flag: VisibilityFlag, visible: bool);

    fn show_locations(&self, locations: &[Location]);
}
