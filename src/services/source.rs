use crate::core::normalize::RawRecord;
use crate::models::BusinessType;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors a record source can report for one retrieval
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unsupported fetch scope: {0}")]
    UnsupportedScope(String),
}

/// How a source organises its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLayout {
    /// One list; rows carry their own business-type tags
    Flat,
    /// One table per business type; the table decides the tag
    PerType,
}

/// What to retrieve in one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    Everything,
    Type(BusinessType),
}

/// Supplier of raw hotspot rows
#[async_trait]
pub trait HotspotSource: Send + Sync {
    /// Source name for logs and responses
    fn name(&self) -> &str;

    fn layout(&self) -> SourceLayout;

    /// Business types this source can serve
    fn catalog(&self) -> &[BusinessType];

    /// Retrieve raw rows. `Flat` sources must support `Everything`,
    /// `PerType` sources must support `Type`.
    async fn fetch(&self, scope: FetchScope) -> Result<Vec<RawRecord>, SourceError>;
}
