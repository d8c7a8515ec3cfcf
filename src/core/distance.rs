use crate::models::BoundingBox;

/// Earth's radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Relative slack added to bounding boxes so float rounding never excludes
/// a point that lies exactly on the search radius
const BBOX_PADDING: f64 = 1.0001;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lng1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lng2` - Longitude of second point in degrees
///
/// # Returns
/// Non-negative distance in kilometers. Inputs outside the valid degree
/// ranges still produce a number, it just has no geographic meaning.
#[inline]
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Calculate a bounding box around a center point
///
/// Much cheaper than Haversine for pre-filtering. The box is a superset of
/// the Haversine disc: near the poles, or when the disc crosses the
/// antimeridian, it widens to the full longitude range.
///
/// # Arguments
/// * `lat` - Center latitude in degrees
/// * `lng` - Center longitude in degrees
/// * `radius_km` - Radius in kilometers
pub fn calculate_bounding_box(lat: f64, lng: f64, radius_km: f64) -> BoundingBox {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat_delta = angular.to_degrees() * BBOX_PADDING;

    let min_lat = (lat - lat_delta).max(-90.0);
    let max_lat = (lat + lat_delta).min(90.0);

    // Widest longitude spread of a spherical cap: asin(sin(r) / cos(lat))
    let cos_lat = lat.to_radians().cos();
    let spread = angular.sin() / cos_lat;

    let full_lng = min_lat <= -90.0
        || max_lat >= 90.0
        || spread.is_nan()
        || spread >= 1.0
        || angular >= std::f64::consts::FRAC_PI_2;

    let (min_lon, max_lon) = if full_lng {
        (-180.0, 180.0)
    } else {
        let lng_delta = spread.asin().to_degrees() * BBOX_PADDING;
        let (lo, hi) = (lng - lng_delta, lng + lng_delta);
        if lo < -180.0 || hi > 180.0 {
            (-180.0, 180.0)
        } else {
            (lo, hi)
        }
    };

    BoundingBox {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(lat: f64, lng: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && lng >= bbox.min_lon
        && lng <= bbox.max_lon
}
