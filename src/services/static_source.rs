use crate::core::normalize::{lookup, Field, RawRecord};
use crate::models::BusinessType;
use crate::services::source::{FetchScope, HotspotSource, SourceError, SourceLayout};
use async_trait::async_trait;
use serde_json::Value;

const CHENNAI_HOTSPOTS: &str = include_str!("../../data/chennai_hotspots.json");

/// In-memory hotspot rows
///
/// Serves the bundled Chennai data set (legacy schema: 0-100 scores,
/// several shop categories per cell) or any list handed to it.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    rows: Vec<RawRecord>,
    catalog: Vec<BusinessType>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, rows: Vec<RawRecord>, catalog: Vec<BusinessType>) -> Self {
        Self {
            name: name.into(),
            rows,
            catalog,
        }
    }

    /// Parse a JSON array of row objects. Array items that are not objects
    /// are rejected, the row contents are left to the normalizer.
    pub fn from_json(
        name: impl Into<String>,
        json: &str,
        catalog: Vec<BusinessType>,
    ) -> Result<Self, SourceError> {
        let parsed: Vec<Value> = serde_json::from_str(json)
            .map_err(|e| SourceError::InvalidResponse(format!("Failed to parse rows: {}", e)))?;

        let rows = parsed
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(SourceError::InvalidResponse(format!(
                    "Expected row object, got {}",
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(name, rows, catalog))
    }

    /// The 25 Chennai cells of the demo data set
    pub fn chennai() -> Result<Self, SourceError> {
        Self::from_json("chennai", CHENNAI_HOTSPOTS, BusinessType::SHOP_CATEGORIES.to_vec())
    }

    /// Restrict or extend the business types this source advertises
    pub fn with_catalog(mut self, catalog: Vec<BusinessType>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn tagged_with(row: &RawRecord, business_type: BusinessType) -> bool {
        match lookup(row, Field::BusinessTypes) {
            Some(Value::String(name)) => name.parse::<BusinessType>().ok() == Some(business_type),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .any(|name| name.parse::<BusinessType>().ok() == Some(business_type)),
            _ => false,
        }
    }
}

#[async_trait]
impl HotspotSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> SourceLayout {
        SourceLayout::Flat
    }

    fn catalog(&self) -> &[BusinessType] {
        &self.catalog
    }

    async fn fetch(&self, scope: FetchScope) -> Result<Vec<RawRecord>, SourceError> {
        let rows = match scope {
            FetchScope::Everything => self.rows.clone(),
            FetchScope::Type(business_type) => self
                .rows
                .iter()
                .filter(|row| Self::tagged_with(row, business_type))
                .cloned()
                .collect(),
        };

        tracing::trace!("Static source {} returned {} rows for {:?}", self.name, rows.len(), scope);
        Ok(rows)
    }
}
