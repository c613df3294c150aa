// Fixed ground locations shown alongside satellites
use super::style::StyleConfig;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub style: StyleConfig,
}
