use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of commercial activity a hotspot is scored for.
///
/// The first six variants are the per-table business types of the hosted
/// store. The remaining variants are the shop categories of the older flat
/// data sets, where a single cell can carry several tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BusinessType {
    Hotel,
    Bakery,
    Supermarket,
    Hardware,
    Stationery,
    Clothing,
    Restaurants,
    Cafes,
    Retail,
    Grocery,
    #[serde(rename = "Health & Beauty")]
    HealthAndBeauty,
    Electronics,
    Fitness,
    Services,
}

impl BusinessType {
    /// Every known business type, in declaration order.
    pub const ALL: [BusinessType; 14] = [
        BusinessType::Hotel,
        BusinessType::Bakery,
        BusinessType::Supermarket,
        BusinessType::Hardware,
        BusinessType::Stationery,
        BusinessType::Clothing,
        BusinessType::Restaurants,
        BusinessType::Cafes,
        BusinessType::Retail,
        BusinessType::Grocery,
        BusinessType::HealthAndBeauty,
        BusinessType::Electronics,
        BusinessType::Fitness,
        BusinessType::Services,
    ];

    /// Business types backed by a table in the hosted store
    pub const TABLE_BACKED: [BusinessType; 6] = [
        BusinessType::Hotel,
        BusinessType::Bakery,
        BusinessType::Supermarket,
        BusinessType::Hardware,
        BusinessType::Stationery,
        BusinessType::Clothing,
    ];

    /// Shop categories used by the flat legacy data sets
    pub const SHOP_CATEGORIES: [BusinessType; 8] = [
        BusinessType::Restaurants,
        BusinessType::Cafes,
        BusinessType::Retail,
        BusinessType::Grocery,
        BusinessType::HealthAndBeauty,
        BusinessType::Electronics,
        BusinessType::Fitness,
        BusinessType::Services,
    ];

    /// Display name, also the name used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessType::Hotel => "Hotel",
            BusinessType::Bakery => "Bakery",
            BusinessType::Supermarket => "Supermarket",
            BusinessType::Hardware => "Hardware",
            BusinessType::Stationery => "Stationery",
            BusinessType::Clothing => "Clothing",
            BusinessType::Restaurants => "Restaurants",
            BusinessType::Cafes => "Cafes",
            BusinessType::Retail => "Retail",
            BusinessType::Grocery => "Grocery",
            BusinessType::HealthAndBeauty => "Health & Beauty",
            BusinessType::Electronics => "Electronics",
            BusinessType::Fitness => "Fitness",
            BusinessType::Services => "Services",
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not belong to the enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown business type: {0}")]
pub struct UnknownBusinessType(pub String);

impl FromStr for BusinessType {
    type Err = UnknownBusinessType;

    /// Case-insensitive; accepts the display name or the variant spelling
    /// (`Health & Beauty` and `HealthAndBeauty`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BusinessType::ALL
            .into_iter()
            .find(|t| {
                t.as_str().eq_ignore_ascii_case(wanted)
                    || format!("{:?}", t).eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownBusinessType(s.to_string()))
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside [-90, 90] x [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Population figures attached to some legacy hotspot cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(rename = "avgAge")]
    pub avg_age: f64,
    #[serde(rename = "avgIncome")]
    pub avg_income: f64,
    #[serde(rename = "populationDensity")]
    pub population_density: f64,
}

/// A pre-scored geographic cell
///
/// Built once by the normalizer and never mutated afterwards; the pipeline
/// only derives new lists from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(rename = "businessTypes")]
    pub business_types: Vec<BusinessType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "footTraffic", default, skip_serializing_if = "Option::is_none")]
    pub foot_traffic: Option<u64>,
    #[serde(rename = "avgRent", default, skip_serializing_if = "Option::is_none")]
    pub avg_rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
}

impl Hotspot {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Three-level display class derived from score or rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    High,
    Medium,
    Low,
}

/// A hotspot that survived filtering, with its search-relative fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHotspot {
    #[serde(flatten)]
    pub hotspot: Hotspot,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    pub intensity: Intensity,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Which business types a search is restricted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSelection {
    /// No restriction; the empty user selection. A search resolves it to
    /// the source's catalog, so rows without a catalog tag never match.
    All,
    /// Only these types. May be empty when every requested name was unknown.
    Only(Vec<BusinessType>),
}

impl TypeSelection {
    /// Build a selection from user-supplied names.
    ///
    /// An empty list means "every type". A non-empty list keeps only the
    /// recognised names, so a list of unknown names selects nothing.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        if names.is_empty() {
            return TypeSelection::All;
        }

        let mut types: Vec<BusinessType> = names
            .iter()
            .filter_map(|n| n.as_ref().parse().ok())
            .collect();
        types.sort();
        types.dedup();
        TypeSelection::Only(types)
    }

    pub fn matches(&self, tags: &[BusinessType]) -> bool {
        match self {
            TypeSelection::All => true,
            TypeSelection::Only(selected) => tags.iter().any(|t| selected.contains(t)),
        }
    }
}

impl From<Vec<BusinessType>> for TypeSelection {
    fn from(types: Vec<BusinessType>) -> Self {
        if types.is_empty() {
            TypeSelection::All
        } else {
            let mut types = types;
            types.sort();
            types.dedup();
            TypeSelection::Only(types)
        }
    }
}

/// Parameters of one hotspot search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub center: Coordinate,
    pub radius_km: f64,
    pub selection: TypeSelection,
    pub max_results: usize,
}
