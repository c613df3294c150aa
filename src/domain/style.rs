// Visual style for anything shown on the map
use crate::error::DecodeError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    pub point_size: f64,
    pub point_color: String,

    pub show_path: bool,
    pub path_width: f64,
    pub path_color: String,
    pub path_seconds_ahead: u32,
    pub path_seconds_behind: u32,

    pub show_sensor: bool,
    pub sensor_line_width: f64,
    pub sensor_color: String,
    pub sensor_fill: bool,
    pub sensor_fill_alpha: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            point_size: 10.0,
            point_color: "#FFFF00".to_string(),
            show_path: true,
            path_width: 2.0,
            path_color: "#00FF00".to_string(),
            path_seconds_ahead: 45 * 60,
            path_seconds_behind: 10 * 60,
            show_sensor: true,
            sensor_line_width: 1.0,
            sensor_color: "#00FFFF".to_string(),
            sensor_fill: false,
            sensor_fill_alpha: 0.2,
        }
    }
}

impl StyleConfig {
    pub fn validate(&self) -> Result<(), DecodeError> {
        check_size("point_size", self.point_size)?;
        check_size("path_width", self.path_width)?;
        check_size("sensor_line_width", self.sensor_line_width)?;
        check_color("point_color", &self.point_color)?;
        check_color("path_color", &self.path_color)?;
        check_color("sensor_color", &self.sensor_color)?;

        if !(0.0..=1.0).contains(&self.sensor_fill_alpha) {
            return Err(DecodeError::invalid(
                "sensor_fill_alpha",
                format!("{} is outside [0, 1]", self.sensor_fill_alpha),
            ));
        }

        Ok(())
    }

    /// How far ahead of the satellite the drawn path reaches.
    pub fn path_lead(&self) -> Duration {
        Duration::from_secs(self.path_seconds_ahead.into())
    }

    pub fn path_trail(&self) -> Duration {
        Duration::from_secs(self.path_seconds_behind.into())
    }
}

fn check_size(field: &'static str, value: f64) -> Result<(), DecodeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DecodeError::invalid(field, format!("{} is not a size >= 0", value)))
    }
}

fn check_color(field: &'static str, value: &str) -> Result<(), DecodeError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err(DecodeError::invalid(field, format!("`{}` is not a #RRGGBB color", value)))
    }
}
