// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, BusinessType, Coordinate, Demographics, Hotspot, Intensity, RankedHotspot,
    SearchQuery, TypeSelection, UnknownBusinessType,
};
pub use requests::SearchHotspotsRequest;
pub use responses::{
    BusinessTypesResponse, DefaultLocationResponse, ErrorResponse, HealthResponse,
    SearchHotspotsResponse,
};
