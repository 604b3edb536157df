use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use skywatch_common::{RefreshResponse, SatellitesResponse};

use crate::service::SkywatchService;

#[derive(Debug, Default, Deserialize)]
pub struct SatellitesQuery {
    /// Search radius in degrees, unparsed
    pub radius: Option<String>,
}

impl SatellitesQuery {
    /// `None` when absent or not a non-negative integer
    pub fn radius(&self) -> Option<u32> {
        self.radius.as_deref().and_then(|r| r.trim().parse().ok())
    }
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "running",
        "service": "skywatch-backend",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

async fn satellites(
    State(service): State<Arc<SkywatchService>>,
    Query(query): Query<SatellitesQuery>,
) -> Json<SatellitesResponse> {
    Json(service.satellites(query.radius()).await)
}

async fn update_reference(State(service): State<Arc<SkywatchService>>) -> Json<RefreshResponse> {
    tracing::info!("Reference update requested");
    Json(service.refresh_reference().await)
}

pub fn router(service: Arc<SkywatchService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/satellites", get(satellites))
        .route("/api/update_reference", post(update_reference))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
