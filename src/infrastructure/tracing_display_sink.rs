// Display sink that reports what would be drawn through tracing
use crate::application::display_sink::{DisplaySink, VisibilityFlag};
use crate::domain::location::Location;
use crate::domain::prediction::PositionSample;
use crate::domain::style::StyleConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub paths: bool,
    pub sensors: bool,
    pub night_shadow: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            paths: true,
            sensors: true,
            night_shadow: false,
        }
    }
}

#[derive(Default)]
struct MapState {
    visibility: Visibility,
    satellites: HashMap<Uuid, usize>,
    locations: usize,
}

/// Stands in for the map renderer when running headless.
#[derive(Default)]
pub struct TracingDisplaySink {
    state: Mutex<MapState>,
}

impl TracingDisplaySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(&self) -> Visibility {
        self.state.lock().visibility
    }

    pub fn shown_satellites(&self) -> usize {
        self.state.lock().satellites.len()
    }
}

impl DisplaySink for TracingDisplaySink {
    fn update(&self, entity_id: Uuid, samples: Arc<[PositionSample]>, style: &StyleConfig) {
        let mut state = self.state.lock();
        state.satellites.insert(entity_id, samples.len());

        let (first, last) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first.at.to_string(), last.at.to_string()),
            _ => (String::new(), String::new()),
        };
        tracing::info!(
            entity_id = %entity_id,
            samples = samples.len(),
            from = %first,
            to = %last,
            show_path = style.show_path && state.visibility.paths,
            path_lead_secs = style.path_lead().as_secs(),
            path_trail_secs = style.path_trail().as_secs(),
            show_sensor = style.show_sensor && state.visibility.sensors,
            "Satellite updated on map"
        );
    }

    fn clear_all(&self) {
        let mut state = self.state.lock();
        state.satellites.clear();
        state.locations = 0;
        tracing::info!("Map cleared");
    }

    fn set_visibility(&self, flag: VisibilityFlag, visible: bool) {
        let mut state = self.state.lock();
        match flag {
            VisibilityFlag::Paths => state.visibility.paths = visible,
            VisibilityFlag::Sensors => state.visibility.sensors = visible,
            VisibilityFlag::NightShadow => state.visibility.night_shadow = visible,
        }
        tracing::info!(flag = ?flag, visible, "Map visibility changed");
    }

    fn show_locations(&self, locations: &[Location]) {
        self.state.lock().locations += locations.len();
        for location in locations {
            tracing::info!(
                location_id = %location.id,
                name = %location.name,
                latitude = location.latitude,
                longitude = location.longitude,
                "Location shown on map"
            );
        }
    }
}
