use serde::{Deserialize, Serialize};
use crate::models::domain::{BusinessType, Coordinate, RankedHotspot};

/// Response for the hotspot search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHotspotsResponse {
    pub hotspots: Vec<RankedHotspot>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "failedTypes")]
    pub failed_types: Vec<BusinessType>,
    pub center: Coordinate,
    pub generation: u64,
}

/// Fallback location used when the caller has no position of its own
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLocationResponse {
    pub lat: f64,
    pub lng: f64,
    pub label: String,
}

/// Business types the active source can serve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessTypesResponse {
    pub source: String,
    #[serde(rename = "businessTypes")]
    pub business_types: Vec<BusinessType>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
