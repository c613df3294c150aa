// Errors shared across layers
use uuid::Uuid;

/// Invalid settings detected while building the tracker. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("rate multiplier must be a finite value >= 0, got {0}")]
    InvalidRateMultiplier(f64),

    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("{name} is out of range: {value}")]
    IntervalOutOfRange { name: &'static str, value: f64 },

    #[error("low_threshold_secs ({low_threshold_secs}) must be below chunk_span_secs ({chunk_span_secs})")]
    ThresholdNotBelowChunk {
        low_threshold_secs: u64,
        chunk_span_secs: u64,
    },

    #[error("invalid prediction service url {url}: {reason}")]
    InvalidServiceUrl { url: String, reason: String },

    #[error("invalid clock start date {0}")]
    InvalidStartDate(String),
}

/// A fetch completed for an entity that is no longer registered (or was registered again since).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("entity {entity_id} is no longer tracked")]
pub struct StaleEntityError {
    pub entity_id: Uuid,
}

/// Boundary validation failure while decoding dashboards, satellites or styles.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed json: {0}")]
    Json(String),
}

impl DecodeError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
