use crate::application::refresh_scheduler::RefreshPolicy;
use crate::domain::time::{Direction, MapInstant, TimeScale};
use crate::error::ConfigurationError;
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/tracker";
const ENV_PREFIX: &str = "TRACKER";

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    pub prediction_service: PredictionServiceSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub clock: ClockSettings,
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictionServiceSettings {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    pub refresh_interval_secs: f64,
    pub chunk_span_secs: u64,
    pub low_threshold_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        let policy = RefreshPolicy::default();
        Self {
            refresh_interval_secs: policy.refresh_interval.as_secs_f64(),
            chunk_span_secs: policy.chunk_span.as_secs(),
            low_threshold_secs: policy.low_threshold.as_secs(),
        }
    }
}

impl RefreshSettings {
    pub fn policy(&self) -> Result<RefreshPolicy, ConfigurationError> {
        if !self.refresh_interval_secs.is_finite() || self.refresh_interval_secs <= 0.0 {
            return Err(ConfigurationError::ZeroInterval {
                name: "refresh_interval_secs",
            });
        }
        if self.chunk_span_secs == 0 {
            return Err(ConfigurationError::ZeroInterval {
                name: "chunk_span_secs",
            });
        }
        // a chunk must outlast the threshold or every tick refetches
        if self.low_threshold_secs >= self.chunk_span_secs {
            return Err(ConfigurationError::ThresholdNotBelowChunk {
                low_threshold_secs: self.low_threshold_secs,
                chunk_span_secs: self.chunk_span_secs,
            });
        }

        let refresh_interval = Duration::try_from_secs_f64(self.refresh_interval_secs)
            .map_err(|_| ConfigurationError::IntervalOutOfRange {
                name: "refresh_interval_secs",
                value: self.refresh_interval_secs,
            })?;

        Ok(RefreshPolicy {
            refresh_interval,
            chunk_span: Duration::from_secs(self.chunk_span_secs),
            low_threshold: Duration::from_secs(self.low_threshold_secs),
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClockSettings {
    /// RFC 3339 map date to start at. Defaults to now.
    pub start: Option<String>,
    pub rate_multiplier: f64,
    pub direction: Direction,
    pub paused: bool,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            start: None,
            rate_multiplier: 1.0,
            direction: Direction::Forward,
            paused: false,
        }
    }
}

impl ClockSettings {
    pub fn time_scale(&self) -> Result<TimeScale, ConfigurationError> {
        Ok(TimeScale::new(self.rate_multiplier, self.direction)?.paused(self.paused))
    }

    pub fn start_instant(&self) -> Result<Option<MapInstant>, ConfigurationError> {
        self.start
            .as_deref()
            .map(|raw| {
                chrono::DateTime::parse_from_rfc3339(raw)
                    .map(|at| MapInstant::new(at.with_timezone(&chrono::Utc)))
                    .map_err(|_| ConfigurationError::InvalidStartDate(raw.to_string()))
            })
            .transpose()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub path: String,
}

/// Load `config/tracker.*`, overridden by `TRACKER__SECTION__KEY` environment variables.
pub fn load_tracker_config() -> anyhow::Result<TrackerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
