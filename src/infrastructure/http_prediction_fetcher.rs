// Prediction service client over HTTP
use crate::application::prediction_fetcher::{FetchError, PredictionFetcher};
use crate::domain::coverage::CoverageWindow;
use crate::domain::prediction::{PositionSample, PredictedPath};
use crate::domain::satellite::TrajectoryDescriptor;
use crate::domain::time::MapInstant;
use crate::error::ConfigurationError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

const PREDICT_PATH: &str = "/api/predict_path/";

#[derive(Debug, Clone)]
pub struct HttpPredictionFetcher {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PredictPathResponse {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    positions: Vec<PositionRecord>,
}

#[derive(Debug, Deserialize)]
struct PositionRecord {
    at_date: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

impl HttpPredictionFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigurationError> {
        let base_url = base_url.into();
        reqwest::Url::parse(&base_url).map_err(|e| ConfigurationError::InvalidServiceUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn build_request_url(
        &self,
        entity_id: Uuid,
        descriptor: &TrajectoryDescriptor,
        window: &CoverageWindow,
    ) -> String {
        format!(
            "{}{}?satellite_id={}&tle={}&start_date={}&end_date={}",
            self.base_url,
            PREDICT_PATH,
            entity_id,
            urlencoding::encode(descriptor.tle()),
            urlencoding::encode(&window.start().to_rfc3339()),
            urlencoding::encode(&window.end().to_rfc3339()),
        )
    }
}

#[async_trait]
impl PredictionFetcher for HttpPredictionFetcher {
    async fn fetch(
        &self,
        entity_id: Uuid,
        descriptor: &TrajectoryDescriptor,
        window: CoverageWindow,
        timeout: Duration,
    ) -> Result<PredictedPath, FetchError> {
        let url = self.build_request_url(entity_id, descriptor, &window);
        tracing::debug!(entity_id = %entity_id, window = %window, "Requesting path predictions");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let body = response.text().await.map_err(|e| transport_error(e, timeout))?;
        parse_response(&body)
    }
}

fn transport_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Transport(error.to_string())
    }
}

fn status_error(status: StatusCode, body: String) -> FetchError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            FetchError::InvalidDescriptor(body)
        }
        _ => FetchError::ServerError(status.as_u16()),
    }
}

fn parse_response(body: &str) -> Result<PredictedPath, FetchError> {
    let response: PredictPathResponse =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
    decode_path(response)
}

/// Validate a service response and turn it into samples the map can use.
fn decode_path(response: PredictPathResponse) -> Result<PredictedPath, FetchError> {
    let window = CoverageWindow::new(
        MapInstant::new(response.start_date),
        MapInstant::new(response.end_date),
    )
    .ok_or_else(|| FetchError::MalformedResponse("start_date is after end_date".to_string()))?;

    // an empty path would mark the window covered with nothing to draw
    if response.positions.is_empty() {
        return Err(FetchError::MalformedResponse("no positions in path".to_string()));
    }

    let mut samples = Vec::with_capacity(response.positions.len());
    for record in response.positions {
        if !(-90.0..=90.0).contains(&record.latitude) || !(-180.0..=180.0).contains(&record.longitude) {
            return Err(FetchError::MalformedResponse(format!(
                "position out of range at {}: ({}, {})",
                record.at_date, record.latitude, record.longitude
            )));
        }
        if !record.altitude.is_finite() {
            return Err(FetchError::MalformedResponse(format!(
                "altitude is not a number at {}",
                record.at_date
            )));
        }

        let sample = PositionSample::new(
            MapInstant::new(record.at_date),
            record.latitude,
            record.longitude,
            record.altitude,
        );
        if samples.last().is_some_and(|prev: &PositionSample| prev.at > sample.at) {
            return Err(FetchError::MalformedResponse(
                "positions are not ordered by date".to_string(),
            ));
        }
        samples.push(sample);
    }

    Ok(PredictedPath::new(window, samples))
}
