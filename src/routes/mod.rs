// Route exports
pub mod hotspots;

use actix_web::web;

pub use hotspots::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(hotspots::configure),
    );
}
