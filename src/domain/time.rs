// Map time domain model - real time vs simulated map time
use crate::error::ConfigurationError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// Wall clock instant. Only the clock adapter and TimeScale anchors deal with these.
pub type RealInstant = tokio::time::Instant;

/// A point on the simulated map clock. Arithmetic saturates at the ends of the chrono range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MapInstant(DateTime<Utc>);

impl MapInstant {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Map time elapsed between `earlier` and `self`, zero if `earlier` is later.
    pub fn since(&self, earlier: MapInstant) -> MapDuration {
        MapDuration::from_delta(self.0 - earlier.0)
    }
}

impl From<DateTime<Utc>> for MapInstant {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl fmt::Display for MapInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A non-negative span of map time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MapDuration(TimeDelta);

impl MapDuration {
    pub const ZERO: MapDuration = MapDuration(TimeDelta::zero());

    pub fn milliseconds(ms: i64) -> Self {
        Self::from_delta(TimeDelta::milliseconds(ms))
    }

    pub fn seconds(secs: i64) -> Self {
        Self::from_delta(TimeDelta::seconds(secs))
    }

    pub fn minutes(minutes: i64) -> Self {
        Self::from_delta(TimeDelta::minutes(minutes))
    }

    fn from_delta(delta: TimeDelta) -> Self {
        if delta < TimeDelta::zero() {
            Self(TimeDelta::zero())
        } else {
            Self(delta)
        }
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.num_milliseconds() as f64 / 1000.0
    }
}

impl Add for MapDuration {
    type Output = MapDuration;

    fn add(self, rhs: MapDuration) -> MapDuration {
        MapDuration(self.0.checked_add(&rhs.0).unwrap_or(TimeDelta::MAX))
    }
}

impl Add<MapDuration> for MapInstant {
    type Output = MapInstant;

    fn add(self, rhs: MapDuration) -> MapInstant {
        MapInstant(
            self.0
                .checked_add_signed(rhs.0)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }
}

impl Sub<MapDuration> for MapInstant {
    type Output = MapInstant;

    fn sub(self, rhs: MapDuration) -> MapInstant {
        MapInstant(
            self.0
                .checked_sub_signed(rhs.0)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// How fast, and which way, map time moves relative to real time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    rate_multiplier: f64,
    direction: Direction,
    is_paused: bool,
}

impl Default for TimeScale {
    fn default() -> Self {
        Self {
            rate_multiplier: 1.0,
            direction: Direction::Forward,
            is_paused: false,
        }
    }
}

impl TimeScale {
    pub fn new(rate_multiplier: f64, direction: Direction) -> Result<Self, ConfigurationError> {
        if !rate_multiplier.is_finite() || rate_multiplier < 0.0 {
            return Err(ConfigurationError::InvalidRateMultiplier(rate_multiplier));
        }

        Ok(Self {
            rate_multiplier,
            direction,
            is_paused: false,
        })
    }

    pub fn paused(self, is_paused: bool) -> Self {
        Self { is_paused, ..self }
    }

    pub fn rate_multiplier(&self) -> f64 {
        self.rate_multiplier
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Map time covered while `real` passes on the wall clock.
    pub fn to_map_duration(&self, real: Duration) -> MapDuration {
        if self.is_paused {
            return MapDuration::ZERO;
        }

        let map_ms = (real.as_secs_f64() * self.rate_multiplier * 1000.0)
            .round()
            .min(i64::MAX as f64);
        MapDuration::milliseconds(map_ms as i64)
    }

    /// Map instant reached after `real_elapsed` starting from `from`.
    pub fn advance(&self, from: MapInstant, real_elapsed: Duration) -> MapInstant {
        let step = self.to_map_duration(real_elapsed);
        match self.direction {
            Direction::Forward => from + step,
            Direction::Backward => from - step,
        }
    }

    pub fn real_to_map_instant(
        &self,
        anchor: (RealInstant, MapInstant),
        real: RealInstant,
    ) -> MapInstant {
        let (real_anchor, map_anchor) = anchor;
        self.advance(map_anchor, real.saturating_duration_since(real_anchor))
    }

    /// Wall clock instant at which the map reaches `map`, if it ever does at the current scale.
    pub fn map_to_real_instant(
        &self,
        anchor: (RealInstant, MapInstant),
        map: MapInstant,
    ) -> Option<RealInstant> {
        let (real_anchor, map_anchor) = anchor;
        if self.is_paused || self.rate_multiplier == 0.0 {
            return (map == map_anchor).then_some(real_anchor);
        }

        let ahead = match self.direction {
            Direction::Forward if map >= map_anchor => map.since(map_anchor),
            Direction::Backward if map <= map_anchor => map_anchor.since(map),
            _ => return None,
        };

        let real_secs = ahead.as_secs_f64() / self.rate_multiplier;
        let wait = Duration::try_from_secs_f64(real_secs).ok()?;
        real_anchor.checked_add(wait)
    }
}
