// Satellite domain model
use super::coverage::CoverageWindow;
use super::prediction::PositionSample;
use super::style::StyleConfig;
use crate::error::DecodeError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// The raw orbital data the prediction service needs, plus when it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrajectoryDescriptor {
    tle: String,
    issued_at: DateTime<Utc>,
}

impl TrajectoryDescriptor {
    pub fn new(tle: impl Into<String>, issued_at: DateTime<Utc>) -> Result<Self, DecodeError> {
        let tle = tle.into();
        let lines = tle.lines().filter(|line| !line.trim().is_empty()).count();
        if !(2..=3).contains(&lines) {
            return Err(DecodeError::invalid(
                "tle",
                format!("expected 2 or 3 lines, got {}", lines),
            ));
        }

        Ok(Self { tle, issued_at })
    }

    pub fn tle(&self) -> &str {
        &self.tle
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Satellite configuration as stored in a dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Satellite {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub norad_id: Option<u32>,
    pub descriptor: Option<TrajectoryDescriptor>,
    pub style: StyleConfig,
}

impl Satellite {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            description: name.clone(),
            name,
            norad_id: None,
            descriptor: None,
            style: StyleConfig::default(),
        }
    }

    pub fn with_descriptor(mut self, descriptor: TrajectoryDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }
}

/// A satellite being tracked on the map together with its cached predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity {
    pub satellite: Satellite,
    pub coverage: Option<CoverageWindow>,
    pub samples: Arc<[PositionSample]>,
}

impl TrackedEntity {
    pub fn new(satellite: Satellite) -> Self {
        Self {
            satellite,
            coverage: None,
            samples: Arc::from(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.satellite.id
    }

    pub fn descriptor(&self) -> Option<&TrajectoryDescriptor> {
        self.satellite.descriptor.as_ref()
    }

    /// Swap in a freshly fetched chunk. Whatever was cached before is dropped, never merged.
    pub fn replace_predictions(&mut self, window: CoverageWindow, samples: Arc<[PositionSample]>) {
        self.coverage = Some(window);
        self.samples = samples;
    }
}
