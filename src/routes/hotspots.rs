use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::{LocationSettings, SearchSettings};
use crate::core::{HotspotFinder, RequestGenerations, SearchError};
use crate::models::{
    BusinessType, BusinessTypesResponse, Coordinate, DefaultLocationResponse, ErrorResponse,
    HealthResponse, SearchHotspotsRequest, SearchHotspotsResponse, SearchQuery, TypeSelection,
};
use crate::services::HotspotSource;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn HotspotSource>,
    pub finder: HotspotFinder,
    pub generations: Arc<RequestGenerations>,
    pub search: SearchSettings,
    pub location: LocationSettings,
}

/// Configure all hotspot-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/business-types", web::get().to(business_types))
        .route("/location/default", web::get().to(default_location))
        .route("/hotspots/search", web::post().to(search_hotspots));
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.source.catalog().is_empty() { "degraded" } else { "healthy" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Business types served by the active source
///
/// GET /api/v1/business-types
async fn business_types(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(BusinessTypesResponse {
        source: state.source.name().to_string(),
        business_types: state.source.catalog().to_vec(),
    })
}

/// Location to center on when the caller has none
///
/// GET /api/v1/location/default
async fn default_location(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(DefaultLocationResponse {
        lat: state.location.fallback_lat,
        lng: state.location.fallback_lng,
        label: state.location.fallback_label.clone(),
    })
}

/// Search hotspots endpoint
///
/// POST /api/v1/hotspots/search
///
/// Request body:
/// ```json
/// {
///   "clientId": "string",
///   "lat": 13.0827,
///   "lng": 80.2707,
///   "radiusKm": 5,
///   "businessTypes": ["Hotel", "Bakery"],
///   "maxResults": 20
/// }
/// ```
///
/// A newer search with the same `clientId` makes an in-flight one answer
/// 409 Conflict.
async fn search_hotspots(
    state: web::Data<AppState>,
    req: web::Json<SearchHotspotsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: field_errors={:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let center = match (req.lat, req.lng) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
        (None, None) => state.location.fallback(),
        _ => {
            return bad_request(
                "Incomplete location",
                "lat and lng must be given together".to_string(),
            );
        }
    };

    if req.business_types.is_empty() && state.search.require_type_selection {
        return bad_request(
            "No business type selected",
            "Select at least one business type to search for hotspots".to_string(),
        );
    }

    let mut selected = Vec::with_capacity(req.business_types.len());
    for name in &req.business_types {
        match name.parse::<BusinessType>() {
            Ok(business_type) => selected.push(business_type),
            Err(e) => return bad_request("Unknown business type", e.to_string()),
        }
    }

    let query = SearchQuery {
        center,
        radius_km: req
            .radius_km
            .unwrap_or(state.search.default_radius_km)
            .min(state.search.max_radius_km),
        selection: TypeSelection::from(selected),
        max_results: req
            .max_results
            .map(usize::from)
            .unwrap_or(state.search.default_max_results)
            .min(state.search.max_results_cap),
    };

    // Anonymous searches never supersede each other
    let key = req
        .client_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!(
        "Searching hotspots for {}: {}km around ({}, {}), selection {:?}, max {}",
        key,
        query.radius_km,
        center.lat,
        center.lng,
        query.selection,
        query.max_results
    );

    match state
        .finder
        .search_latest(&query, &state.source, &state.generations, &key)
        .await
    {
        Ok((generation, result)) => {
            if !result.failed_types.is_empty() {
                tracing::warn!("Search for {} is missing types: {:?}", key, result.failed_types);
            }

            HttpResponse::Ok().json(SearchHotspotsResponse {
                hotspots: result.hotspots,
                total_candidates: result.total_candidates,
                failed_types: result.failed_types,
                center,
                generation: generation.id(),
            })
        }
        Err(SearchError::InvalidQuery(message)) => bad_request("Invalid search", message),
        Err(e @ SearchError::Superseded { .. }) => HttpResponse::Conflict().json(ErrorResponse {
            error: "Search superseded".to_string(),
            message: e.to_string(),
            status_code: 409,
        }),
    }
}
