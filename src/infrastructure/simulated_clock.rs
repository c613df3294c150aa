// Simulated map clock - map time driven by the wall clock at an adjustable rate
use crate::application::map_clock::{ClockError, MapClock};
use crate::domain::time::{MapInstant, RealInstant, TimeScale};
use parking_lot::Mutex;

struct ClockState {
    anchor: (RealInstant, MapInstant),
    scale: TimeScale,
}

impl ClockState {
    fn now(&self) -> MapInstant {
        self.scale.real_to_map_instant(self.anchor, RealInstant::now())
    }

    fn reanchor(&mut self, map_now: MapInstant) {
        self.anchor = (RealInstant::now(), map_now);
    }
}

/// Map clock the way the viewer runs it: a start date plus real time elapsed times the
/// current multiplier. Changing the scale or jumping to a date re-anchors the clock so map
/// time never jumps on a rate change.
pub struct SimulatedMapClock {
    state: Mutex<ClockState>,
}

impl SimulatedMapClock {
    pub fn new(start: MapInstant, scale: TimeScale) -> Self {
        Self {
            state: Mutex::new(ClockState {
                anchor: (RealInstant::now(), start),
                scale,
            }),
        }
    }

    pub fn set_time_scale(&self, scale: TimeScale) {
        let mut state = self.state.lock();
        let map_now = state.now();
        state.reanchor(map_now);
        state.scale = scale;
        tracing::debug!(
            rate_multiplier = scale.rate_multiplier(),
            paused = scale.is_paused(),
            "Map clock scale changed"
        );
    }

    pub fn set_paused(&self, paused: bool) {
        let scale = self.state.lock().scale.paused(paused);
        self.set_time_scale(scale);
    }

    /// Jump the map to `at`.
    pub fn go_to(&self, at: MapInstant) {
        self.state.lock().reanchor(at);
        tracing::info!(map_date = %at, "Map clock moved");
    }
}

impl MapClock for SimulatedMapClock {
    fn current_map_instant(&self) -> Result<MapInstant, ClockError> {
        Ok(self.state.lock().now())
    }

    fn current_time_scale(&self) -> Result<TimeScale, ClockError> {
        Ok(self.state.lock().scale)
    }
}
