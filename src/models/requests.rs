use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to search for hotspots around a location
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchHotspotsRequest {
    /// Identifies the caller whose previous searches a new one supersedes
    #[validate(length(min = 1, max = 128))]
    #[serde(alias = "client_id", rename = "clientId", default)]
    pub client_id: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default)]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default)]
    pub lng: Option<f64>,
    #[validate(range(min = 0.0, max = 50.0))]
    #[serde(alias = "radius_km", rename = "radiusKm", default)]
    pub radius_km: Option<f64>,
    #[serde(alias = "business_types", rename = "businessTypes", default)]
    pub business_types: Vec<String>,
    #[validate(range(min = 1, max = 100))]
    #[serde(alias = "max_results", rename = "maxResults", default)]
    pub max_results: Option<u16>,
}
