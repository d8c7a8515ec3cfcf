// Integration tests for Hotspot Finder

use hotspot_finder::core::{HotspotFinder, IntensityScale, Normalizer, RankingPolicy, RequestGenerations};
use hotspot_finder::models::{BusinessType, Coordinate, Intensity, SearchQuery, TypeSelection};
use hotspot_finder::services::{HotspotSource, StaticSource, TableStoreClient};
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::Duration;

const CHENNAI: Coordinate = Coordinate { lat: 13.0827, lng: 80.2707 };

fn legacy_finder() -> HotspotFinder {
    HotspotFinder::new(
        Normalizer::new(100.0),
        RankingPolicy::ScoreDescending,
        IntensityScale::score(90.0, 70.0),
        Duration::from_secs(5),
    )
}

fn chennai_source() -> Arc<dyn HotspotSource> {
    Arc::new(StaticSource::chennai().unwrap())
}

fn create_query(radius_km: f64, selection: TypeSelection, max_results: usize) -> SearchQuery {
    SearchQuery {
        center: CHENNAI,
        radius_km,
        selection,
        max_results,
    }
}

fn ids(result: &hotspot_finder::SearchResult) -> Vec<&str> {
    result.hotspots.iter().map(|h| h.hotspot.id.as_str()).collect()
}

#[tokio::test]
async fn test_integration_chennai_top_three() {
    let finder = legacy_finder();
    let result = finder
        .filter_hotspots(&create_query(5.0, TypeSelection::All, 3), &chennai_source())
        .await
        .unwrap();

    assert_eq!(ids(&result), vec!["1", "2", "3"]);
    let scores: Vec<f64> = result.hotspots.iter().map(|h| h.hotspot.score).collect();
    assert_eq!(scores, vec![95.0, 92.0, 90.0]);
    assert!(result.hotspots.iter().all(|h| h.distance_km <= 5.0));
    assert_eq!(result.hotspots[0].intensity, Intensity::High);
    assert_eq!(result.total_candidates, 25);
    assert!(result.failed_types.is_empty());
}

#[tokio::test]
async fn test_integration_chennai_radius_excludes_mylapore() {
    let finder = legacy_finder();
    let result = finder
        .filter_hotspots(&create_query(5.0, TypeSelection::All, 100), &chennai_source())
        .await
        .unwrap();

    assert_eq!(result.hotspots.len(), 6);
    assert!(!ids(&result).contains(&"22"));

    let wider = finder
        .filter_hotspots(&create_query(5.2, TypeSelection::All, 100), &chennai_source())
        .await
        .unwrap();
    assert!(ids(&wider).contains(&"22"));
}

#[tokio::test]
async fn test_integration_fitness_only() {
    let finder = legacy_finder();
    let result = finder
        .filter_hotspots(
            &create_query(5.0, TypeSelection::Only(vec![BusinessType::Fitness]), 20),
            &chennai_source(),
        )
        .await
        .unwrap();

    assert_eq!(ids(&result), vec!["5", "8"]);
    assert!(result
        .hotspots
        .iter()
        .all(|h| h.hotspot.business_types.contains(&BusinessType::Fitness)));
}

#[tokio::test]
async fn test_integration_empty_selection_matches_full_catalog() {
    let finder = legacy_finder();
    let source = chennai_source();

    let empty = finder
        .filter_hotspots(&create_query(20.0, TypeSelection::from(vec![]), 100), &source)
        .await
        .unwrap();
    let full = finder
        .filter_hotspots(
            &create_query(20.0, TypeSelection::from(source.catalog().to_vec()), 100),
            &source,
        )
        .await
        .unwrap();

    assert!(!empty.hotspots.is_empty());
    assert_eq!(empty.hotspots, full.hotspots);
}

#[test]
fn test_integration_no_hotspots_far_away() {
    let finder = legacy_finder();
    let query = SearchQuery {
        center: Coordinate::new(-33.8688, 151.2093),
        radius_km: 50.0,
        selection: TypeSelection::All,
        max_results: 20,
    };

    let result = tokio_test::block_on(finder.filter_hotspots(&query, &chennai_source())).unwrap();
    assert!(result.hotspots.is_empty());
    assert_eq!(result.total_candidates, 25);
}

#[test]
fn test_integration_latest_search_for_client() {
    let finder = legacy_finder();
    let generations = RequestGenerations::new();

    let (generation, result) = tokio_test::block_on(finder.search_latest(
        &create_query(5.0, TypeSelection::All, 3),
        &chennai_source(),
        &generations,
        "dashboard",
    ))
    .unwrap();

    assert_eq!(generation.key(), "dashboard");
    assert_eq!(result.hotspots.len(), 3);
    assert_eq!(generations.in_flight(), 0);
}

fn table_store(url: &str, catalog: Vec<BusinessType>) -> Arc<dyn HotspotSource> {
    Arc::new(
        TableStoreClient::new(url.to_string(), "test_key".to_string(), catalog, Duration::from_secs(5))
            .unwrap(),
    )
}

#[tokio::test]
async fn test_integration_table_store_partial_failure() {
    let mut server = Server::new_async().await;
    let _hotel = server
        .mock("GET", "/rest/v1/Hotel")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"CelID": "h1", "Lat": 13.0830, "Lon": 80.2710, "Score_0_1000": 910, "Rank": 12},
                {"CelID": "h2", "Lat": 13.4000, "Lon": 80.2710, "Score_0_1000": 990, "Rank": 1}
            ]"#,
        )
        .create_async()
        .await;
    let _bakery = server
        .mock("GET", "/rest/v1/Bakery")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"CellD": "b1", "Lat": "13.0900", "Lon": "80.2750", "Score_0_1000": 720}]"#)
        .create_async()
        .await;
    let _clothing = server
        .mock("GET", "/rest/v1/Clothing")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let source = table_store(
        &server.url(),
        vec![BusinessType::Hotel, BusinessType::Bakery, BusinessType::Clothing],
    );
    let finder = HotspotFinder::default();

    let result = finder
        .filter_hotspots(&create_query(5.0, TypeSelection::All, 20), &source)
        .await
        .unwrap();

    let found = ids(&result);
    assert_eq!(found, vec!["h1", "b1"]);
    assert_eq!(result.failed_types, vec![BusinessType::Clothing]);
    assert_eq!(result.total_candidates, 3);
    assert_eq!(result.hotspots[0].intensity, Intensity::High);
    assert_eq!(result.hotspots[1].intensity, Intensity::Medium);
    assert_eq!(result.hotspots[0].hotspot.business_types, vec![BusinessType::Hotel]);
}

#[tokio::test]
async fn test_integration_table_store_fetches_selected_tables_only() {
    let mut server = Server::new_async().await;
    let hotel = server
        .mock("GET", "/rest/v1/Hotel")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"CelID": 7, "Lat": 13.0827, "Lon": 80.2707, "Score_0_1000": 500}]"#)
        .expect(1)
        .create_async()
        .await;
    let bakery = server
        .mock("GET", "/rest/v1/Bakery")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let source = table_store(&server.url(), vec![BusinessType::Hotel, BusinessType::Bakery]);
    let result = HotspotFinder::default()
        .filter_hotspots(
            &create_query(5.0, TypeSelection::Only(vec![BusinessType::Hotel]), 20),
            &source,
        )
        .await
        .unwrap();

    hotel.assert_async().await;
    bakery.assert_async().await;
    assert_eq!(ids(&result), vec!["7"]);
    assert_eq!(result.hotspots[0].intensity, Intensity::Low);
}

#[tokio::test]
async fn test_integration_table_store_total_failure() {
    let mut server = Server::new_async().await;
    let _denied = server
        .mock("GET", Matcher::Regex(r"^/rest/v1/".to_string()))
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let source = table_store(&server.url(), vec![BusinessType::Hotel, BusinessType::Bakery]);
    let result = HotspotFinder::default()
        .filter_hotspots(&create_query(5.0, TypeSelection::All, 20), &source)
        .await
        .unwrap();

    assert!(result.hotspots.is_empty());
    assert_eq!(result.total_candidates, 0);
    assert_eq!(result.failed_types, vec![BusinessType::Hotel, BusinessType::Bakery]);
}
