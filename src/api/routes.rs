// API routes configuration
// Author: Gabriel Demetrios Lafis

use actix_web::{web, HttpResponse, Responder};

use super::handlers;

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .route("/ranges", web::get().to(handlers::list_ranges))
            .route("/sites", web::get().to(handlers::list_sites))
            .route("/records", web::get().to(handlers::get_records))
            .route("/top/{dimension}", web::get().to(handlers::top_by_dimension))
            .route("/summary", web::get().to(handlers::get_summary))
            .route("/timeseries", web::get().to(handlers::get_time_series)),
    );
}

/// Health check handler
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
