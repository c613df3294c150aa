// Dashboard definitions stored as JSON
use crate::domain::dashboard::Dashboard;
use crate::domain::location::Location;
use crate::domain::satellite::{Satellite, TrajectoryDescriptor};
use crate::domain::style::StyleConfig;
use crate::error::DecodeError;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct DashboardRecord {
    id: Option<i64>,
    name: Option<String>,
    #[serde(default)]
    config: DashboardContents,
}

#[derive(Debug, Default, Deserialize)]
struct DashboardContents {
    #[serde(default)]
    satellites: Vec<SatelliteRecord>,
    #[serde(default)]
    locations: Vec<LocationRecord>,
}

#[derive(Debug, Deserialize)]
struct SatelliteRecord {
    id: Option<Uuid>,
    name: Option<String>,
    description: Option<String>,
    norad_id: Option<u32>,
    tle: Option<String>,
    tle_date: Option<DateTime<Utc>>,
    style: Option<StyleRecord>,
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    id: Option<Uuid>,
    name: Option<String>,
    description: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
    style: Option<StyleRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct StyleRecord {
    point_size: Option<f64>,
    point_color: Option<String>,
    show_path: Option<bool>,
    path_width: Option<f64>,
    path_color: Option<String>,
    path_seconds_ahead: Option<u32>,
    path_seconds_behind: Option<u32>,
    show_sensor: Option<bool>,
    sensor_line_width: Option<f64>,
    sensor_color: Option<String>,
    sensor_fill: Option<bool>,
    sensor_fill_alpha: Option<f64>,
}

impl TryFrom<StyleRecord> for StyleConfig {
    type Error = DecodeError;

    fn try_from(record: StyleRecord) -> Result<Self, Self::Error> {
        let defaults = StyleConfig::default();
        let style = StyleConfig {
            point_size: record.point_size.unwrap_or(defaults.point_size),
            point_color: record.point_color.unwrap_or(defaults.point_color),
            show_path: record.show_path.unwrap_or(defaults.show_path),
            path_width: record.path_width.unwrap_or(defaults.path_width),
            path_color: record.path_color.unwrap_or(defaults.path_color),
            path_seconds_ahead: record.path_seconds_ahead.unwrap_or(defaults.path_seconds_ahead),
            path_seconds_behind: record.path_seconds_behind.unwrap_or(defaults.path_seconds_behind),
            show_sensor: record.show_sensor.unwrap_or(defaults.show_sensor),
            sensor_line_width: record.sensor_line_width.unwrap_or(defaults.sensor_line_width),
            sensor_color: record.sensor_color.unwrap_or(defaults.sensor_color),
            sensor_fill: record.sensor_fill.unwrap_or(defaults.sensor_fill),
            sensor_fill_alpha: record.sensor_fill_alpha.unwrap_or(defaults.sensor_fill_alpha),
        };
        style.validate()?;
        Ok(style)
    }
}

fn decode_style(record: Option<StyleRecord>) -> Result<StyleConfig, DecodeError> {
    record.unwrap_or_default().try_into()
}

impl TryFrom<SatelliteRecord> for Satellite {
    type Error = DecodeError;

    fn try_from(record: SatelliteRecord) -> Result<Self, Self::Error> {
        let descriptor = match (record.tle, record.tle_date) {
            (Some(tle), Some(issued_at)) => Some(TrajectoryDescriptor::new(tle, issued_at)?),
            (Some(_), None) => return Err(DecodeError::MissingField("tle_date")),
            (None, _) => None,
        };

        let name = record.name.unwrap_or_else(|| "New satellite".to_string());
        Ok(Satellite {
            id: record.id.unwrap_or_else(Uuid::new_v4),
            description: record.description.unwrap_or_else(|| name.clone()),
            name,
            norad_id: record.norad_id,
            descriptor,
            style: decode_style(record.style)?,
        })
    }
}

impl TryFrom<LocationRecord> for Location {
    type Error = DecodeError;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        let latitude = record.latitude.ok_or(DecodeError::MissingField("latitude"))?;
        let longitude = record.longitude.ok_or(DecodeError::MissingField("longitude"))?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DecodeError::invalid("latitude", format!("{} is out of range", latitude)));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DecodeError::invalid("longitude", format!("{} is out of range", longitude)));
        }

        let name = record.name.unwrap_or_else(|| "New location".to_string());
        Ok(Location {
            id: record.id.unwrap_or_else(Uuid::new_v4),
            description: record.description.unwrap_or_else(|| name.clone()),
            name,
            latitude,
            longitude,
            altitude: record.altitude,
            style: decode_style(record.style)?,
        })
    }
}

impl TryFrom<DashboardRecord> for Dashboard {
    type Error = DecodeError;

    fn try_from(record: DashboardRecord) -> Result<Self, Self::Error> {
        let id = record.id.ok_or(DecodeError::MissingField("id"))?;
        let satellites = record
            .config
            .satellites
            .into_iter()
            .map(Satellite::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let locations = record
            .config
            .locations
            .into_iter()
            .map(Location::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dashboard::new(
            id,
            record.name.unwrap_or_else(|| "New dashboard".to_string()),
            satellites,
            locations,
        ))
    }
}

pub fn decode_dashboard(json: &str) -> Result<Dashboard, DecodeError> {
    let record: DashboardRecord =
        serde_json::from_str(json).map_err(|e| DecodeError::Json(e.to_string()))?;
    record.try_into()
}

pub fn load_dashboard(path: impl AsRef<Path>) -> anyhow::Result<Dashboard> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dashboard file {}", path.display()))?;

    decode_dashboard(&json).with_context(|| format!("Invalid dashboard file {}", path.display()))
}
