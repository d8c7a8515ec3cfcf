use crate::core::normalize::RawRecord;
use crate::models::BusinessType;
use crate::services::source::{FetchScope, HotspotSource, SourceError, SourceLayout};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Table holding the scored cells of a business type
pub fn default_table_name(business_type: BusinessType) -> &'static str {
    match business_type {
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
        BusinessType::HealthAndBeauty => "HealthBeauty",
        BusinessType::Electronics => "Electronics",
        BusinessType::Fitness => "Fitness",
        BusinessType::Services => "Services",
    }
}

/// Client for the hosted table store
///
/// Each business type lives in its own table, served over a REST
/// interface (`GET /rest/v1/{table}?select=*`). One search therefore
/// issues one request per business type.
pub struct TableStoreClient {
    base_url: String,
    api_key: String,
    client: Client,
    catalog: Vec<BusinessType>,
    table_overrides: BTreeMap<BusinessType, String>,
}

impl TableStoreClient {
    /// Create a new table store client
    pub fn new(
        base_url: String,
        api_key: String,
        catalog: Vec<BusinessType>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            catalog,
            table_overrides: BTreeMap::new(),
        })
    }

    /// Use `table` instead of the default table name for `business_type`
    pub fn with_table(mut self, business_type: BusinessType, table: impl Into<String>) -> Self {
        self.table_overrides.insert(business_type, table.into());
        self
    }

    pub fn table_name(&self, business_type: BusinessType) -> &str {
        self.table_overrides
            .get(&business_type)
            .map(String::as_str)
            .unwrap_or_else(|| default_table_name(business_type))
    }

    fn table_url(&self, business_type: BusinessType) -> String {
        format!(
            "{}/rest/v1/{}?select=*",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(self.table_name(business_type))
        )
    }

    /// Fetch every row of one business type's table
    pub async fn fetch_table(&self, business_type: BusinessType) -> Result<Vec<RawRecord>, SourceError> {
        let url = self.table_url(business_type);

        tracing::debug!("Fetching {} rows from: {}", business_type, url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(SourceError::ApiError(format!(
                "Failed to fetch {}: {} - {}",
                business_type, status, body
            )));
        }

        let json: Value = response.json().await?;

        let rows = json
            .as_array()
            .ok_or_else(|| SourceError::InvalidResponse("Expected an array of rows".into()))?;

        let records: Vec<RawRecord> = rows
            .iter()
            .filter_map(|row| row.as_object().cloned())
            .collect();

        let skipped = rows.len() - records.len();
        if skipped > 0 {
            tracing::debug!("Skipped {} non-object {} rows", skipped, business_type);
        }

        tracing::debug!("Fetched {} {} rows", records.len(), business_type);

        Ok(records)
    }
}

#[async_trait]
impl HotspotSource for TableStoreClient {
    fn name(&self) -> &str {
        "table_store"
    }

    fn layout(&self) -> SourceLayout {
        SourceLayout::PerType
    }

    fn catalog(&self) -> &[BusinessType] {
        &self.catalog
    }

    async fn fetch(&self, scope: FetchScope) -> Result<Vec<RawRecord>, SourceError> {
        match scope {
            FetchScope::Type(business_type) => self.fetch_table(business_type).await,
            FetchScope::Everything => Err(SourceError::UnsupportedScope(
                "table store is queried one business type at a time".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_client(base_url: &str) -> TableStoreClient {
        TableStoreClient::new(
            base_url.to_string(),
            "test_key".to_string(),
            BusinessType::TABLE_BACKED.to_vec(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_table_store_client_creation() {
        let client = create_client("https://store.test/");

        assert_eq!(client.base_url, "https://store.test/");
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.catalog().len(), 6);
        assert_eq!(
            client.table_url(BusinessType::Hotel),
            "https://store.test/rest/v1/Hotel?select=*"
        );
    }

    #[test]
    fn test_table_overrides() {
        let client = create_client("https://store.test").with_table(BusinessType::Bakery, "bakery cells");

        assert_eq!(client.table_name(BusinessType::Bakery), "bakery cells");
        assert_eq!(client.table_name(BusinessType::Hotel), "Hotel");
        assert_eq!(
            client.table_url(BusinessType::Bakery),
            "https://store.test/rest/v1/bakery%20cells?select=*"
        );
    }

    #[tokio::test]
    async fn test_fetch_table_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/Hotel")
            .match_query(mockito::Matcher::Any)
            .match_header("apikey", "test_key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"CelID": 1, "Lat": 13.08, "Lon": 80.27, "Score_0_1000": 910}, "junk"]"#)
            .create_async()
            .await;

        let client = create_client(&server.url());
        let rows = client.fetch(FetchScope::Type(BusinessType::Hotel)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("CelID"), Some(&serde_json::json!(1)));
    }

    #[tokio::test]
    async fn test_fetch_table_errors() {
        let mut server = mockito::Server::new_async().await;
        let _denied = server
            .mock("GET", "/rest/v1/Bakery")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/rest/v1/Hardware")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("relation does not exist")
            .create_async()
            .await;
        let _object = server
            .mock("GET", "/rest/v1/Clothing")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"message": "not a list"}"#)
            .create_async()
            .await;

        let client = create_client(&server.url());

        let denied = client.fetch_table(BusinessType::Bakery).await;
        assert!(matches!(denied, Err(SourceError::Unauthorized)));

        let broken = client.fetch_table(BusinessType::Hardware).await;
        assert!(matches!(broken, Err(SourceError::ApiError(ref m)) if m.contains("500")));

        let object = client.fetch_table(BusinessType::Clothing).await;
        assert!(matches!(object, Err(SourceError::InvalidResponse(_))));

        let everything = client.fetch(FetchScope::Everything).await;
        assert!(matches!(everything, Err(SourceError::UnsupportedScope(_))));
    }
}
