use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Service banner
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "TaskManager API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Health check endpoint
///
/// Returns the current status of the API and timestamp.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}
