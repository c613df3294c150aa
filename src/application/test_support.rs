// Test doubles for the capability traits
use crate::application::display_sink::{DisplaySink, VisibilityFlag};
use crate::application::map_clock::{ClockError, MapClock};
use crate::application::prediction_fetcher::{FetchError, PredictionFetcher};
use crate::domain::coverage::CoverageWindow;
use crate::domain::location::Location;
use crate::domain::prediction::{PositionSample, PredictedPath};
use crate::domain::satellite::TrajectoryDescriptor;
use crate::domain::style::StyleConfig;
use crate::domain::time::{MapInstant, TimeScale};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

pub fn t0() -> MapInstant {
    MapInstant::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

pub struct FixedClock {
    now: Mutex<MapInstant>,
    scale: Mutex<TimeScale>,
}

impl FixedClock {
    pub fn at(now: MapInstant) -> Self {
        Self {
            now: Mutex::new(now),
            scale: Mutex::new(TimeScale::default()),
        }
    }

    pub fn with_scale(self, scale: TimeScale) -> Self {
        *self.scale.lock() = scale;
        self
    }
}

impl MapClock for FixedClock {
    fn current_map_instant(&self) -> Result<MapInstant, ClockError> {
        Ok(*self.now.lock())
    }

    fn current_time_scale(&self) -> Result<TimeScale, ClockError> {
        Ok(*self.scale.lock())
    }
}

pub struct BrokenClock;

impl MapClock for BrokenClock {
    fn current_map_instant(&self) -> Result<MapInstant, ClockError> {
        Err(ClockError::Unavailable("viewer not ready".to_string()))
    }

    fn current_time_scale(&self) -> Result<TimeScale, ClockError> {
        Err(ClockError::Unavailable("viewer not ready".to_string()))
    }
}

#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(FetchError),
    Delay(Duration),
    WaitFor(Arc<Notify>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub entity_id: Uuid,
    pub window: CoverageWindow,
    pub timeout: Duration,
}

/// Answers every request with two samples spanning exactly the requested window.
#[derive(Default)]
pub struct ScriptedFetcher {
    behaviors: Mutex<HashMap<Uuid, Behavior>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedFetcher {
    pub fn set(&self, entity_id: Uuid, behavior: Behavior) {
        self.behaviors.lock().insert(entity_id, behavior);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }
}

pub fn path_for(window: CoverageWindow) -> PredictedPath {
    PredictedPath::new(
        window,
        vec![
            PositionSample::new(window.start(), 0.0, 0.0, 420_000.0),
            PositionSample::new(window.end(), 1.0, 1.0, 421_000.0),
        ],
    )
}

#[async_trait]
impl PredictionFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        entity_id: Uuid,
        _descriptor: &TrajectoryDescriptor,
        window: CoverageWindow,
        timeout: Duration,
    ) -> Result<PredictedPath, FetchError> {
        self.calls.lock().push(FetchCall {
            entity_id,
            window,
            timeout,
        });
        let behavior = self
            .behaviors
            .lock()
            .get(&entity_id)
            .cloned()
            .unwrap_or(Behavior::Succeed);

        match behavior {
            Behavior::Succeed => {}
            Behavior::Fail(error) => return Err(error),
            Behavior::Delay(delay) => tokio::time::sleep(delay).await,
            Behavior::WaitFor(notify) => notify.notified().await,
        }
        Ok(path_for(window))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub updates: Mutex<Vec<(Uuid, usize)>>,
    pub clears: Mutex<usize>,
    pub visibility: Mutex<Vec<(VisibilityFlag, bool)>>,
    pub locations: Mutex<Vec<Uuid>>,
}

impl RecordingSink {
    pub fn updated_ids(&self) -> Vec<Uuid> {
        self.updates.lock().iter().map(|(id, _)| *id).collect()
    }
}

impl DisplaySink for RecordingSink {
    fn update(&self, entity_id: Uuid, samples: Arc<[PositionSample]>, _style: &StyleConfig) {
        self.updates.lock().push((entity_id, samples.len()));
    }

    fn clear_all(&self) {
        *self.clears.lock() += 1;
        self.locations.lock().clear();
    }

    fn set_visibility(&self, flag: VisibilityFlag, visible: bool) {
        self.visibility.lock().push((flag, visible));
    }

    fn show_locations(&self, locations: &[Location]) {
        self.locations.lock().extend(locations.iter().map(|l| l.id));
    }
}
