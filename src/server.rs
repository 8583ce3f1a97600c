// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP server for metrics, health and the service plan API.
//!
//! Routes:
//! - `GET /metrics` - Prometheus text exposition
//! - `GET /healthz` - Liveness probe
//! - `GET /v3/service_plans` - Plans in the root namespace

use crate::constants::{HEALTH_SERVER_PATH, METRICS_SERVER_PATH, SERVICE_PLANS_PATH};
use crate::metrics;
use crate::presenter::{for_service_plan_list, ListResponse, ServicePlanResponse};
use crate::repositories::ServicePlanRepo;
use crate::store::{ObjectStore, StoreError};
use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

/// Errors returned by API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to list service plans: {0}")]
    Store(#[from] StoreError),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("API request failed: {self}");
        let body = serde_json::json!({
            "errors": [{
                "title": "CF-UnknownError",
                "detail": "An unknown error occurred.",
                "code": 10001
            }]
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// State shared by the API handlers.
pub struct ApiState<S> {
    pub plans: ServicePlanRepo<S>,
    /// External base URL used to build links.
    pub base_url: Url,
}

async fn metrics_handler() -> Result<Response, ApiError> {
    let body = metrics::gather_metrics()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn list_service_plans<S: ObjectStore>(
    State(state): State<Arc<ApiState<S>>>,
) -> Result<Json<ListResponse<ServicePlanResponse>>, ApiError> {
    let plans = state.plans.list_plans().await?;
    Ok(Json(for_service_plan_list(&plans, &state.base_url)))
}

/// Create the server router.
pub fn router<S: ObjectStore + 'static>(state: Arc<ApiState<S>>) -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route(HEALTH_SERVER_PATH, get(health_handler))
        .route(SERVICE_PLANS_PATH, get(list_service_plans::<S>))
        .with_state(state)
}

/// Serve `router` on `addr` until the process stops.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Metrics and API server listening on {addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod server_tests;
