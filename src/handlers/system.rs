//! Banner and health endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::loan_service::LoanService;

pub async fn root() -> &'static str {
    "LoanDesk API Server"
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
pub async fn health_check(
    State(service): State<Arc<LoanService>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match service.store_health().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected".to_string()),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            format!("error: {}", e),
        ),
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            database,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
