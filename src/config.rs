use crate::core::{HotspotFinder, IntensityScale, Normalizer, RankingPolicy};
use crate::models::{BusinessType, Coordinate};
use crate::services::{HotspotSource, StaticSource, TableStoreClient};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub location: LocationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Where hotspot rows come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Bundled Chennai data set
    #[default]
    Static,
    /// Hosted table store, one table per business type
    TableStore,
}

impl SourceKind {
    pub fn default_score_max(self) -> f64 {
        match self {
            SourceKind::Static => 100.0,
            SourceKind::TableStore => 1000.0,
        }
    }

    pub fn default_intensity(self) -> IntensityScale {
        match self {
            SourceKind::Static => IntensityScale::score(90.0, 70.0),
            SourceKind::TableStore => IntensityScale::score(900.0, 700.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub kind: SourceKind,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Business types to offer; empty means the kind's default catalog
    #[serde(default)]
    pub catalog: Vec<String>,
    /// Table name overrides, keyed by business type
    #[serde(default)]
    pub tables: HashMap<String, String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            endpoint: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            catalog: Vec::new(),
            tables: HashMap::new(),
        }
    }
}

fn default_request_timeout_secs() -> u64 { 10 }

impl SourceSettings {
    /// Configured catalog, or the default one for the source kind
    pub fn catalog(&self) -> Result<Vec<BusinessType>, ConfigError> {
        if self.catalog.is_empty() {
            return Ok(match self.kind {
                SourceKind::Static => BusinessType::SHOP_CATEGORIES.to_vec(),
                SourceKind::TableStore => BusinessType::TABLE_BACKED.to_vec(),
            });
        }

        let mut catalog = self
            .catalog
            .iter()
            .map(|name| name.parse::<BusinessType>().map_err(|e| ConfigError::Message(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        catalog.sort();
        catalog.dedup();
        Ok(catalog)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the configured record source
    pub fn build(&self) -> Result<Arc<dyn HotspotSource>, ConfigError> {
        let catalog = self.catalog()?;

        match self.kind {
            SourceKind::Static => {
                let source = StaticSource::chennai()
                    .map_err(|e| ConfigError::Message(e.to_string()))?
                    .with_catalog(catalog);
                Ok(Arc::new(source))
            }
            SourceKind::TableStore => {
                let endpoint = self
                    .endpoint
                    .clone()
                    .ok_or_else(|| ConfigError::NotFound("source.endpoint".into()))?;
                let api_key = self
                    .api_key
                    .clone()
                    .ok_or_else(|| ConfigError::NotFound("source.api_key".into()))?;

                let mut client = TableStoreClient::new(endpoint, api_key, catalog, self.request_timeout())
                    .map_err(|e| ConfigError::Message(e.to_string()))?;

                for (name, table) in &self.tables {
                    let business_type = name
                        .parse::<BusinessType>()
                        .map_err(|e| ConfigError::Message(e.to_string()))?;
                    client = client.with_table(business_type, table.clone());
                }

                Ok(Arc::new(client))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
    #[serde(default = "default_max_results_cap")]
    pub max_results_cap: usize,
    /// Reject searches that select no business type at all
    #[serde(default = "default_true")]
    pub require_type_selection: bool,
    #[serde(default)]
    pub ranking: RankingPolicy,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            max_radius_km: default_max_radius_km(),
            default_max_results: default_max_results(),
            max_results_cap: default_max_results_cap(),
            require_type_selection: true,
            ranking: RankingPolicy::default(),
        }
    }
}

fn default_radius_km() -> f64 { 5.0 }
fn default_max_radius_km() -> f64 { 50.0 }
fn default_max_results() -> usize { 20 }
fn default_max_results_cap() -> usize { 100 }
fn default_true() -> bool { true }

/// Score scale overrides
///
/// Each source kind has its own scale: the bundled data set scores 0-100,
/// the table store 0-1000. Unset values follow the configured source kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    /// Upper bound of the score scale
    pub score_max: Option<f64>,
    pub intensity: Option<IntensityScale>,
}

impl ScoringSettings {
    pub fn score_max(&self, kind: SourceKind) -> f64 {
        self.score_max.unwrap_or_else(|| kind.default_score_max())
    }

    pub fn intensity(&self, kind: SourceKind) -> IntensityScale {
        self.intensity.unwrap_or_else(|| kind.default_intensity())
    }
}

/// Location used when the caller cannot provide one
#[derive(Debug, Clone, Deserialize)]
pub struct LocationSettings {
    #[serde(default = "default_fallback_lat")]
    pub fallback_lat: f64,
    #[serde(default = "default_fallback_lng")]
    pub fallback_lng: f64,
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            fallback_lat: default_fallback_lat(),
            fallback_lng: default_fallback_lng(),
            fallback_label: default_fallback_label(),
        }
    }
}

impl LocationSettings {
    pub fn fallback(&self) -> Coordinate {
        Coordinate::new(self.fallback_lat, self.fallback_lng)
    }
}

fn default_fallback_lat() -> f64 { 40.7589 }
fn default_fallback_lng() -> f64 { -73.9851 }
fn default_fallback_label() -> String { "New York City, NY".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with HOTSPOT__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., HOTSPOT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("HOTSPOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("HOTSPOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Search pipeline configured from the scoring and search sections
    pub fn finder(&self) -> HotspotFinder {
        HotspotFinder::new(
            Normalizer::new(self.scoring.score_max(self.source.kind)),
            self.search.ranking,
            self.scoring.intensity(self.source.kind),
            self.source.request_timeout(),
        )
    }
}

/// Pick up the table store endpoint and key from the conventional
/// `TABLE_STORE_URL` / `TABLE_STORE_KEY` variables when set
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(endpoint) = env::var("TABLE_STORE_URL") {
        builder = builder.set_override("source.endpoint", endpoint)?;
    }
    if let Ok(api_key) = env::var("TABLE_STORE_KEY") {
        builder = builder.set_override("source.api_key", api_key)?;
    }

    builder.build()
}
