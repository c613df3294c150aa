// Predicted satellite positions
use super::coverage::CoverageWindow;
use super::time::MapInstant;
use std::sync::Arc;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSample {
    pub at: MapInstant,
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above the surface.
    pub altitude: f64,
    /// Radius in metres of the ground area visible from the satellite at this altitude.
    pub visible_radius: f64,
}

impl PositionSample {
    pub fn new(at: MapInstant, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            at,
            latitude,
            longitude,
            altitude,
            visible_radius: visible_radius(altitude),
        }
    }
}

/// Arc length from the sub-satellite point to the horizon.
pub fn visible_radius(altitude: f64) -> f64 {
    if altitude <= 0.0 {
        return 0.0;
    }
    EARTH_RADIUS_M * (EARTH_RADIUS_M / (EARTH_RADIUS_M + altitude)).acos()
}

/// One chunk of predictions as returned by the prediction service.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedPath {
    pub window: CoverageWindow,
    pub samples: Arc<[PositionSample]>,
}

impl PredictedPath {
    pub fn new(window: CoverageWindow, samples: Vec<PositionSample>) -> Self {
        Self {
            window,
            samples: samples.into(),
        }
    }
}
