use crate::models::{BoundingBox, Hotspot, TypeSelection};

/// Radius test. The boundary is inclusive: a hotspot exactly `radius_km`
/// away is kept.
#[inline]
pub fn within_radius(distance_km: f64, radius_km: f64) -> bool {
    distance_km <= radius_km
}

/// Cheap rectangular pre-filter run before the Haversine test
#[inline]
pub fn within_search_area(hotspot: &Hotspot, bbox: &BoundingBox) -> bool {
    super::distance::is_within_bounding_box(hotspot.lat, hotspot.lng, bbox)
}

/// Check if a hotspot carries at least one selected business type
///
/// `TypeSelection::All` accepts every hotspot, including untagged ones.
#[inline]
pub fn matches_selection(hotspot: &Hotspot, selection: &TypeSelection) -> bool {
    selection.matches(&hotspot.business_types)
}
