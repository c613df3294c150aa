// Capability trait for the external prediction service
use crate::domain::coverage::CoverageWindow;
use crate::domain::prediction::PredictedPath;
use crate::domain::satellite::TrajectoryDescriptor;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// Why a single entity's prediction request failed. Always scoped to that entity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("prediction request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("prediction service rejected the trajectory descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("prediction service answered with status {0}")]
    ServerError(u16),

    #[error("malformed prediction response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait PredictionFetcher: Send + Sync {
    /// Predicted positions for `window`, ordered by time.
    async fn fetch(
        &self,
        entity_id: Uuid,
        descriptor: &TrajectoryDescriptor,
        window: CoverageWindow,
        timeout: Duration,
    ) -> Result<PredictedPath, FetchError>;
}
