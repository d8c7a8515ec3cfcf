//! Row normalization
//!
//! Rows arrive as loosely-typed JSON objects whose column names changed
//! between schema versions. Every spelling of every column is listed in
//! [`FIELD_ALIASES`]; nothing else in the crate looks at raw column names.

use crate::models::{BusinessType, Coordinate, Demographics, Hotspot};
use serde_json::{Map, Value};

/// A raw row as returned by a record source
pub type RawRecord = Map<String, Value>;

/// Logical columns of a hotspot row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Lat,
    Lng,
    Score,
    Rank,
    BusinessTypes,
    Address,
    FootTraffic,
    AvgRent,
    Demographics,
}

/// Column spellings per logical field, tried in order
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Id, &["CellID", "CelID", "CellD", "cellId", "id"]),
    (Field::Lat, &["Lat", "lat", "latitude"]),
    (Field::Lng, &["Lon", "lng", "lon", "longitude"]),
    (Field::Score, &["Score_0_1000", "score"]),
    (Field::Rank, &["Rank", "rank"]),
    (Field::BusinessTypes, &["businessType", "shopTypes", "businessTypes"]),
    (Field::Address, &["address", "Address"]),
    (Field::FootTraffic, &["footTraffic", "foot_traffic"]),
    (Field::AvgRent, &["avgRent", "avg_rent"]),
    (Field::Demographics, &["demographics"]),
];

fn aliases(field: Field) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

/// First non-null value stored under any alias of `field`
pub fn lookup(row: &RawRecord, field: Field) -> Option<&Value> {
    aliases(field)
        .iter()
        .filter_map(|name| row.get(*name))
        .find(|v| !v.is_null())
}

/// Numbers may come back as JSON numbers or numeric strings
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn as_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_business_types(value: &Value) -> Vec<BusinessType> {
    let names: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => vec![],
    };

    let mut types: Vec<BusinessType> = names.iter().filter_map(|n| n.parse().ok()).collect();
    types.sort();
    types.dedup();
    types
}

/// Turns raw rows into canonical [`Hotspot`]s
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    score_max: f64,
}

impl Normalizer {
    /// `score_max` is the upper bound of the score scale in use
    /// (1000 for the per-type tables, 100 for the legacy data set).
    pub fn new(score_max: f64) -> Self {
        Self { score_max }
    }

    pub fn score_max(&self) -> f64 {
        self.score_max
    }

    /// Normalize one row
    ///
    /// `origin` is the business type of the table the row came from, if the
    /// source is organised per type; otherwise tags are read from the row.
    /// Returns `None` for malformed rows: missing identifier, missing or
    /// out-of-range coordinates. Scores above the scale are capped at
    /// `score_max` with a warning, since they point at a misconfigured scale.
    pub fn normalize(&self, row: &RawRecord, origin: Option<BusinessType>) -> Option<Hotspot> {
        let (hotspot, over_scale) = self.normalize_row(row, origin)?;
        if let Some(raw) = over_scale {
            tracing::warn!(
                "Score {} of {} exceeds the scale maximum {}",
                raw,
                hotspot.id,
                self.score_max
            );
        }
        Some(hotspot)
    }

    /// Normalized hotspot plus the raw score when it was above the scale
    fn normalize_row(&self, row: &RawRecord, origin: Option<BusinessType>) -> Option<(Hotspot, Option<f64>)> {
        let id = lookup(row, Field::Id).and_then(as_identifier)?;
        let lat = lookup(row, Field::Lat).and_then(as_number)?;
        let lng = lookup(row, Field::Lng).and_then(as_number)?;

        if !Coordinate::new(lat, lng).is_valid() {
            return None;
        }

        let raw_score = lookup(row, Field::Score).and_then(as_number).unwrap_or(0.0);
        let over_scale = (raw_score > self.score_max).then_some(raw_score);
        let score = raw_score.clamp(0.0, self.score_max);

        let rank = lookup(row, Field::Rank)
            .and_then(as_number)
            .filter(|r| *r >= 0.0)
            .map(|r| r as u32);

        let business_types = match origin {
            Some(business_type) => vec![business_type],
            None => lookup(row, Field::BusinessTypes)
                .map(as_business_types)
                .unwrap_or_default(),
        };

        let hotspot = Hotspot {
            id,
            lat,
            lng,
            score,
            rank,
            business_types,
            address: lookup(row, Field::Address)
                .and_then(Value::as_str)
                .map(str::to_string),
            foot_traffic: lookup(row, Field::FootTraffic)
                .and_then(as_number)
                .filter(|n| *n >= 0.0)
                .map(|n| n as u64),
            avg_rent: lookup(row, Field::AvgRent).and_then(as_number),
            demographics: lookup(row, Field::Demographics)
                .and_then(|v| serde_json::from_value::<Demographics>(v.clone()).ok()),
        };

        Some((hotspot, over_scale))
    }

    /// Normalize a batch, dropping malformed rows
    pub fn normalize_all(&self, rows: &[RawRecord], origin: Option<BusinessType>) -> Vec<Hotspot> {
        let mut over_scale = 0usize;
        let mut highest = f64::NEG_INFINITY;
        let hotspots: Vec<Hotspot> = rows
            .iter()
            .filter_map(|row| self.normalize_row(row, origin))
            .map(|(hotspot, raw)| {
                if let Some(raw) = raw {
                    over_scale += 1;
                    highest = highest.max(raw);
                }
                hotspot
            })
            .collect();

        if over_scale > 0 {
            tracing::warn!(
                "Capped {} scores at {} (highest {}, origin: {}); check the configured score scale",
                over_scale,
                self.score_max,
                highest,
                origin.map(|t| t.as_str()).unwrap_or("flat")
            );
        }

        let dropped = rows.len() - hotspots.len();
        if dropped > 0 {
            tracing::debug!(
                "Dropped {} malformed rows (origin: {})",
                dropped,
                origin.map(|t| t.as_str()).unwrap_or("flat")
            );
        }

        hotspots
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_identifier_aliases() {
        let normalizer = Normalizer::default();
        for column in ["CellID", "CelID", "CellD"] {
            let mut raw = row(json!({ "Lat": 13.05, "Lon": 80.25, "Score_0_1000": 812 }));
            raw.insert(column.to_string(), json!(4711));

            let hotspot = normalizer
                .normalize(&raw, Some(BusinessType::Bakery))
                .unwrap_or_else(|| panic!("{} should normalize", column));
            assert_eq!(hotspot.id, "4711");
            assert_eq!(hotspot.score, 812.0);
            assert_eq!(hotspot.business_types, vec![BusinessType::Bakery]);
        }
    }

    #[test]
    fn test_missing_required_fields_dropped() {
        let normalizer = Normalizer::default();
        let no_id = row(json!({ "Lat": 13.05, "Lon": 80.25 }));
        let no_lat = row(json!({ "CellID": "a", "Lon": 80.25 }));
        let no_lon = row(json!({ "CellID": "a", "Lat": 13.05 }));
        let null_lon = row(json!({ "CellID": "a", "Lat": 13.05, "Lon": null }));
        let blank_id = row(json!({ "CellID": "  ", "Lat": 13.05, "Lon": 80.25 }));

        for raw in [no_id, no_lat, no_lon, null_lon, blank_id] {
            assert!(normalizer.normalize(&raw, None).is_none(), "{:?}", raw);
        }
    }

    #[test]
    fn test_zero_coordinates_are_valid() {
        let normalizer = Normalizer::default();
        let raw = row(json!({ "CellID": "gulf", "Lat": 0, "Lon": 0 }));
        let hotspot = normalizer.normalize(&raw, None).unwrap();
        assert_eq!((hotspot.lat, hotspot.lng), (0.0, 0.0));
    }

    #[test]
    fn test_out_of_range_coordinates_dropped() {
        let normalizer = Normalizer::default();
        let raw = row(json!({ "CellID": "x", "Lat": 95.0, "Lon": 80.0 }));
        assert!(normalizer.normalize(&raw, None).is_none());
    }

    #[test]
    fn test_score_bounds() {
        let normalizer = Normalizer::new(100.0);
        let missing = row(json!({ "id": "a", "lat": 1.0, "lng": 1.0 }));
        let negative = row(json!({ "id": "b", "lat": 1.0, "lng": 1.0, "score": -5 }));
        let too_high = row(json!({ "id": "c", "lat": 1.0, "lng": 1.0, "score": 250 }));
        let text = row(json!({ "id": "d", "lat": "1.5", "lng": "2.5", "score": "42.5" }));

        assert_eq!(normalizer.normalize(&missing, None).unwrap().score, 0.0);
        assert_eq!(normalizer.normalize(&negative, None).unwrap().score, 0.0);
        assert_eq!(normalizer.normalize(&too_high, None).unwrap().score, 100.0);

        let parsed = normalizer.normalize(&text, None).unwrap();
        assert_eq!(parsed.score, 42.5);
        assert_eq!((parsed.lat, parsed.lng), (1.5, 2.5));
    }

    #[test]
    fn test_flat_row_with_enrichment() {
        let normalizer = Normalizer::new(100.0);
        let raw = row(json!({
            "id": "1",
            "lat": 13.0827,
            "lng": 80.2707,
            "score": 95,
            "shopTypes": ["Restaurants", "Cafes", "Retail", "Nightclubs"],
            "address": "T. Nagar, Chennai",
            "footTraffic": 45000,
            "avgRent": 8000,
            "demographics": { "avgAge": 30, "avgIncome": 65000, "populationDensity": 24000 }
        }));

        let hotspot = normalizer.normalize(&raw, None).unwrap();
        assert_eq!(
            hotspot.business_types,
            vec![BusinessType::Restaurants, BusinessType::Cafes, BusinessType::Retail]
        );
        assert_eq!(hotspot.address.as_deref(), Some("T. Nagar, Chennai"));
        assert_eq!(hotspot.foot_traffic, Some(45000));
        assert_eq!(hotspot.avg_rent, Some(8000.0));
        assert_eq!(hotspot.demographics.map(|d| d.avg_age), Some(30.0));
    }

    #[test]
    fn test_normalize_all_counts() {
        let normalizer = Normalizer::default();
        let rows = vec![
            row(json!({ "CelID": 1, "Lat": 13.0, "Lon": 80.0 })),
            row(json!({ "CelID": 2, "Lon": 80.0 })),
            row(json!({ "CellD": 3, "Lat": 13.1, "Lon": 80.1, "Rank": 12 })),
        ];

        let hotspots = normalizer.normalize_all(&rows, Some(BusinessType::Hotel));
        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[1].rank, Some(12));
    }

    #[test]
    fn test_thousand_point_scores_stay_distinct() {
        let rows = vec![
            row(json!({ "CelID": "a", "Lat": 13.08, "Lon": 80.27, "Score_0_1000": 910 })),
            row(json!({ "CelID": "b", "Lat": 13.09, "Lon": 80.27, "Score_0_1000": 720 })),
        ];

        let scores: Vec<f64> = Normalizer::new(1000.0)
            .normalize_all(&rows, Some(BusinessType::Hotel))
            .iter()
            .map(|h| h.score)
            .collect();
        assert_eq!(scores, vec![910.0, 720.0]);

        // The wrong scale caps both, which is what the warning is for
        let capped: Vec<f64> = Normalizer::new(100.0)
            .normalize_all(&rows, Some(BusinessType::Hotel))
            .iter()
            .map(|h| h.score)
            .collect();
        assert_eq!(capped, vec![100.0, 100.0]);
    }
}
