use crate::core::{
    distance::{calculate_bounding_box, haversine_distance},
    filters::{matches_selection, within_radius, within_search_area},
    generation::{Generation, RequestGenerations},
    normalize::Normalizer,
    ranking::{IntensityScale, RankingPolicy},
};
use crate::models::{BusinessType, Hotspot, RankedHotspot, SearchQuery, TypeSelection};
use crate::services::{FetchScope, HotspotSource, SourceError, SourceLayout};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;

/// Errors that stop a search before or after retrieval
///
/// Per-row and per-type problems are not errors; they only shrink the result.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("Invalid search: {0}")]
    InvalidQuery(String),

    #[error("Search {generation} was superseded by a newer search")]
    Superseded { generation: u64 },
}

/// Result of one search
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Ranked hotspots, at most `max_results` of them
    pub hotspots: Vec<RankedHotspot>,
    /// Well-formed candidates retrieved before any filtering
    pub total_candidates: usize,
    /// Business types whose retrieval failed or timed out
    pub failed_types: Vec<BusinessType>,
}

/// Hotspot search orchestrator
///
/// # Pipeline Stages
/// 1. Retrieval (once, or once per business type, concurrently)
/// 2. Normalization of raw rows
/// 3. Bounding box pre-filter and Haversine radius filter
/// 4. Business-type filter
/// 5. Ranking and truncation
#[derive(Debug, Clone)]
pub struct HotspotFinder {
    normalizer: Normalizer,
    policy: RankingPolicy,
    intensity: IntensityScale,
    fetch_timeout: Duration,
}

impl HotspotFinder {
    pub fn new(
        normalizer: Normalizer,
        policy: RankingPolicy,
        intensity: IntensityScale,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            normalizer,
            policy,
            intensity,
            fetch_timeout,
        }
    }

    pub fn policy(&self) -> RankingPolicy {
        self.policy
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn intensity(&self) -> &IntensityScale {
        &self.intensity
    }

    /// Reject queries that cannot be answered meaningfully
    pub fn validate(query: &SearchQuery) -> Result<(), SearchError> {
        if !query.center.is_valid() {
            return Err(SearchError::InvalidQuery(format!(
                "center ({}, {}) is not a valid coordinate",
                query.center.lat, query.center.lng
            )));
        }
        if !query.radius_km.is_finite() || query.radius_km < 0.0 {
            return Err(SearchError::InvalidQuery(format!(
                "radius must be a non-negative number of kilometers, got {}",
                query.radius_km
            )));
        }
        if query.max_results == 0 {
            return Err(SearchError::InvalidQuery("max results must be at least 1".into()));
        }
        Ok(())
    }

    /// Filter, sort and truncate candidates
    ///
    /// Pure: no I/O, and the candidates are only moved into the result.
    pub fn rank(&self, query: &SearchQuery, candidates: Vec<Hotspot>) -> Vec<RankedHotspot> {
        let center = query.center;
        let bbox = calculate_bounding_box(center.lat, center.lng, query.radius_km);

        let mut kept: Vec<(Hotspot, f64)> = candidates
            .into_iter()
            .filter(|hotspot| within_search_area(hotspot, &bbox))
            .filter_map(|hotspot| {
                let distance_km = haversine_distance(center.lat, center.lng, hotspot.lat, hotspot.lng);
                within_radius(distance_km, query.radius_km).then_some((hotspot, distance_km))
            })
            .filter(|(hotspot, _)| matches_selection(hotspot, &query.selection))
            .collect();

        kept.sort_by(|(a, a_distance), (b, b_distance)| {
            self.policy.compare(a, *a_distance, b, *b_distance)
        });
        kept.truncate(query.max_results);

        kept.into_iter()
            .map(|(hotspot, distance_km)| RankedHotspot {
                intensity: self.intensity.classify(&hotspot),
                hotspot,
                distance_km,
            })
            .collect()
    }

    /// Business types a search has to retrieve from `source`
    fn types_to_fetch(source: &dyn HotspotSource, selection: &TypeSelection) -> Vec<BusinessType> {
        match selection {
            TypeSelection::All => source.catalog().to_vec(),
            TypeSelection::Only(types) => {
                let (served, unserved): (Vec<BusinessType>, Vec<BusinessType>) =
                    types.iter().copied().partition(|t| source.catalog().contains(t));
                if !unserved.is_empty() {
                    tracing::debug!("Source {} does not serve {:?}", source.name(), unserved);
                }
                served
            }
        }
    }

    async fn fetch_with_timeout(
        source: &dyn HotspotSource,
        scope: FetchScope,
        timeout: Duration,
    ) -> Result<Vec<crate::core::normalize::RawRecord>, SourceError> {
        match tokio::time::timeout(timeout, source.fetch(scope)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout)),
        }
    }

    /// Retrieve and normalize candidates. Returns the candidates and the
    /// business types whose retrieval failed.
    async fn retrieve(
        &self,
        source: &Arc<dyn HotspotSource>,
        types: &[BusinessType],
    ) -> (Vec<Hotspot>, Vec<BusinessType>) {
        match source.layout() {
            SourceLayout::Flat => {
                match Self::fetch_with_timeout(source.as_ref(), FetchScope::Everything, self.fetch_timeout).await {
                    Ok(rows) => (self.normalizer.normalize_all(&rows, None), vec![]),
                    Err(e) => {
                        tracing::warn!("Retrieval from {} failed: {}", source.name(), e);
                        (vec![], types.to_vec())
                    }
                }
            }
            SourceLayout::PerType => {
                let mut tasks = JoinSet::new();
                for &business_type in types {
                    let source = Arc::clone(source);
                    let timeout = self.fetch_timeout;
                    tasks.spawn(async move {
                        let result = Self::fetch_with_timeout(
                            source.as_ref(),
                            FetchScope::Type(business_type),
                            timeout,
                        )
                        .await;
                        (business_type, result)
                    });
                }

                let mut pending: BTreeSet<BusinessType> = types.iter().copied().collect();
                let mut by_type: BTreeMap<BusinessType, Vec<Hotspot>> = BTreeMap::new();
                let mut failed = Vec::new();

                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok((business_type, Ok(rows))) => {
                            pending.remove(&business_type);
                            let hotspots = self.normalizer.normalize_all(&rows, Some(business_type));
                            tracing::debug!("{}: {} candidates", business_type, hotspots.len());
                            by_type.insert(business_type, hotspots);
                        }
                        Ok((business_type, Err(e))) => {
                            pending.remove(&business_type);
                            tracing::warn!("Skipping {}: {}", business_type, e);
                            failed.push(business_type);
                        }
                        Err(e) => tracing::error!("Retrieval task aborted: {}", e),
                    }
                }

                // Tasks that panicked never reported their type
                failed.extend(pending);
                failed.sort();

                (by_type.into_values().flatten().collect(), failed)
            }
        }
    }

    /// Run the complete search pipeline against `source`
    pub async fn filter_hotspots(
        &self,
        query: &SearchQuery,
        source: &Arc<dyn HotspotSource>,
    ) -> Result<SearchResult, SearchError> {
        Self::validate(query)?;

        let types = Self::types_to_fetch(source.as_ref(), &query.selection);
        if types.is_empty() {
            tracing::info!("No business type of the selection is served by {}", source.name());
            return Ok(SearchResult::default());
        }

        let (candidates, failed_types) = self.retrieve(source, &types).await;
        let total_candidates = candidates.len();

        if !failed_types.is_empty() && failed_types.len() == types.len() {
            tracing::error!("Every retrieval from {} failed", source.name());
        }

        // Filter against the types actually retrieved, so that `All` and an
        // explicit full-catalog selection agree on untagged or foreign rows
        let scoped = SearchQuery {
            selection: TypeSelection::Only(types),
            ..query.clone()
        };
        let hotspots = self.rank(&scoped, candidates);

        tracing::info!(
            "Returning {} hotspots within {}km of ({}, {}) (from {} candidates, {} failed types)",
            hotspots.len(),
            query.radius_km,
            query.center.lat,
            query.center.lng,
            total_candidates,
            failed_types.len()
        );

        Ok(SearchResult {
            hotspots,
            total_candidates,
            failed_types,
        })
    }

    /// Run a search as the newest one for `key`
    ///
    /// If another search for the same key starts before this one finishes,
    /// this one resolves to [`SearchError::Superseded`] and its results are
    /// discarded. The key is released when the search ends or is dropped.
    pub async fn search_latest(
        &self,
        query: &SearchQuery,
        source: &Arc<dyn HotspotSource>,
        generations: &RequestGenerations,
        key: &str,
    ) -> Result<(Generation, SearchResult), SearchError> {
        let guard = generations.begin(key);
        let result = self.filter_hotspots(query, source).await;

        if !guard.is_current() {
            let generation = guard.generation().id();
            tracing::debug!("Discarding superseded search {} for {}", generation, key);
            return Err(SearchError::Superseded { generation });
        }

        result.map(|r| (guard.generation().clone(), r))
    }
}

impl Default for HotspotFinder {
    fn default() -> Self {
        Self::new(
            Normalizer::default(),
            RankingPolicy::default(),
            IntensityScale::default(),
            Duration::from_secs(10),
        )
    }
}
