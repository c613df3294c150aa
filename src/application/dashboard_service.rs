// Dashboard service - switching dashboards and editing what is tracked
use crate::application::display_sink::{DisplaySink, VisibilityFlag};
use crate::application::entity_registry::EntityRegistry;
use crate::application::events::{EventBus, TrackerEvent};
use crate::domain::dashboard::Dashboard;
use crate::domain::satellite::{Satellite, TrackedEntity};
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

const UNSAVED_DASHBOARD: &str = "New dashboard";

#[derive(Clone)]
pub struct DashboardService {
    registry: Arc<EntityRegistry>,
    sink: Arc<dyn DisplaySink>,
    events: EventBus,
    current: Arc<RwLock<Option<Arc<Dashboard>>>>,
}

impl DashboardService {
    pub fn new(registry: Arc<EntityRegistry>, sink: Arc<dyn DisplaySink>, events: EventBus) -> Self {
        Self {
            registry,
            sink,
            events,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Make `dashboard` the one being shown. Previously cached predictions are dropped; the
    /// scheduler picks the new satellites up on its next tick.
    pub fn set_current_dashboard(&self, dashboard: Dashboard) {
        let dashboard = Arc::new(dashboard);
        tracing::info!(
            dashboard_id = dashboard.id,
            name = %dashboard.name,
            satellites = dashboard.satellites.len(),
            locations = dashboard.locations.len(),
            "Switching dashboard"
        );

        self.registry.replace_all(dashboard.tracked_entities());
        *self.current.write() = Some(Arc::clone(&dashboard));
        self.events.publish(TrackerEvent::DashboardChanged(dashboard));
    }

    pub fn current_dashboard(&self) -> Option<Arc<Dashboard>> {
        self.current.read().clone()
    }

    pub fn add_satellite(&self, satellite: Satellite) -> Uuid {
        let id = satellite.id;
        tracing::debug!(entity_id = %id, satellite = %satellite.name, "Tracking satellite");
        self.registry.add(TrackedEntity::new(satellite.clone()));
        self.edit_current(|dashboard| {
            match dashboard.satellites.iter_mut().find(|s| s.id == id) {
                Some(existing) => *existing = satellite,
                None => dashboard.satellites.push(satellite),
            }
        });
        id
    }

    /// Stop tracking `id`. The map is redrawn without it.
    pub fn remove_satellite(&self, id: Uuid) -> bool {
        let removed = self.registry.remove(id).is_some();
        if removed {
            tracing::debug!(entity_id = %id, "Stopped tracking satellite");
            self.edit_current(|dashboard| dashboard.satellites.retain(|s| s.id != id));
        }
        removed
    }

    /// Apply `edit` to the current dashboard (an empty one if none was set) and announce it.
    fn edit_current(&self, edit: impl FnOnce(&mut Dashboard)) {
        let dashboard = {
            let mut current = self.current.write();
            let mut dashboard = current
                .as_deref()
                .cloned()
                .unwrap_or_else(|| {
                    Dashboard::new(0, UNSAVED_DASHBOARD.to_string(), Vec::new(), Vec::new())
                });
            edit(&mut dashboard);
            let dashboard = Arc::new(dashboard);
            *current = Some(Arc::clone(&dashboard));
            dashboard
        };
        self.events.publish(TrackerEvent::DashboardChanged(dashboard));
    }

    pub fn set_visibility(&self, flag: VisibilityFlag, visible: bool) {
        self.sink.set_visibility(flag, visible);
    }
}
