// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod generation;
pub mod normalize;
pub mod pipeline;
pub mod ranking;

pub use distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box};
pub use filters::{matches_selection, within_radius, within_search_area};
pub use generation::{Generation, GenerationGuard, RequestGenerations};
pub use normalize::{Normalizer, RawRecord};
pub use pipeline::{HotspotFinder, SearchError, SearchResult};
pub use ranking::{IntensityBasis, IntensityScale, RankingPolicy};
