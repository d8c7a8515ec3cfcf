//! Hotspot Finder - nearby business-opportunity search service
//!
//! Given a location, a radius and the business types a user cares about,
//! this library finds pre-scored geographic cells ("hotspots") around the
//! location and ranks them. Records come from the bundled Chennai data set
//! or from a hosted table store with one table per business type.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    calculate_bounding_box, haversine_distance, HotspotFinder, RankingPolicy, RequestGenerations,
    SearchError, SearchResult,
};
pub use models::{BusinessType, Coordinate, Hotspot, RankedHotspot, SearchQuery, TypeSelection};
pub use services::{HotspotSource, StaticSource, TableStoreClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let bbox = calculate_bounding_box(13.0827, 80.2707, 5.0);
        assert!(bbox.min_lat < 13.0827);
        assert_eq!(haversine_distance(13.0827, 80.2707, 13.0827, 80.2707), 0.0);
    }
}
