use crate::models::{Hotspot, Intensity};
use serde::Deserialize;
use std::cmp::Ordering;

/// Ordering applied to the hotspots that pass the filters
///
/// Both orders end with the hotspot id, so equal keys never depend on the
/// order in which candidates were retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    /// Highest score first, then closest, then id ascending
    #[default]
    ScoreDescending,
    /// Closest first, then highest score, then id ascending
    DistanceAscending,
}

impl RankingPolicy {
    pub fn compare(&self, a: &Hotspot, a_distance: f64, b: &Hotspot, b_distance: f64) -> Ordering {
        let by_score = || b.score.total_cmp(&a.score);
        let by_distance = || a_distance.total_cmp(&b_distance);

        let primary = match self {
            RankingPolicy::ScoreDescending => by_score().then_with(by_distance),
            RankingPolicy::DistanceAscending => by_distance().then_with(by_score),
        };

        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// What an intensity bucket is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityBasis {
    /// Higher score is hotter: `score >= high` is High
    Score,
    /// Lower rank is hotter: `rank <= high` is High
    Rank,
}

/// Thresholds for the high/medium/low display buckets
///
/// The data sets disagree on where the lines are (900/700 on the 0-1000
/// scale, rank 97/323, or 90/70 on the 0-100 scale), so they are
/// configuration rather than constants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct IntensityScale {
    pub basis: IntensityBasis,
    pub high: f64,
    pub medium: f64,
}

impl IntensityScale {
    pub fn score(high: f64, medium: f64) -> Self {
        Self { basis: IntensityBasis::Score, high, medium }
    }

    pub fn rank(high: f64, medium: f64) -> Self {
        Self { basis: IntensityBasis::Rank, high, medium }
    }

    /// Bucket for a hotspot. Rank-based scales put unranked hotspots in Low.
    pub fn classify(&self, hotspot: &Hotspot) -> Intensity {
        match self.basis {
            IntensityBasis::Score => {
                if hotspot.score >= self.high {
                    Intensity::High
                } else if hotspot.score >= self.medium {
                    Intensity::Medium
                } else {
                    Intensity::Low
                }
            }
            IntensityBasis::Rank => match hotspot.rank.map(f64::from) {
                Some(rank) if rank <= self.high => Intensity::High,
                Some(rank) if rank <= self.medium => Intensity::Medium,
                _ => Intensity::Low,
            },
        }
    }
}

impl Default for IntensityScale {
    fn default() -> Self {
        Self::score(900.0, 700.0)
    }
}
