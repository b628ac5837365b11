// SPDX-License-Identifier: PMPL-1.0-or-later
//! Coupon API
//!
//! HTTP API server for coupon records.
//! Every handler makes exactly one call on the injected `CouponStore`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use coupon_store::{ConfigError, Coupon, CouponFilter, CouponStore, StatsHandle, StoreError, StoreStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn};

/// Paths the coupon resource is served under.
pub const RESOURCE_PATHS: [&str; 2] = ["/coupons", "/records"];

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            StoreError::NotFound { id } => ApiError::NotFound(format!("coupon {} not found", id)),
            err @ StoreError::Persistence { .. } => ApiError::Internal(err.to_string()),
            err @ StoreError::Unsupported(_) => ApiError::NotImplemented(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::NotImplemented(msg) => (StatusCode::NOT_IMPLEMENTED, msg),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

impl ApiConfig {
    /// Read `COUPON_API_HOST` and `PORT` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = lookup("COUPON_API_HOST").filter(|h| !h.is_empty()) {
            config.host = host;
        }
        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            config.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: "PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(config)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: String,
    pub stats: Option<StoreStats>,
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub start_time: std::time::Instant,
    pub store: Arc<dyn CouponStore>,
    pub stats: Option<StatsHandle>,
}

impl AppState {
    pub fn new(store: Arc<dyn CouponStore>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            store,
            stats: None,
        }
    }

    /// Report these statistics from `/health`.
    pub fn with_stats(mut self, stats: StatsHandle) -> Self {
        self.stats = Some(stats);
        self
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(health_handler));
    for path in RESOURCE_PATHS {
        router = router
            .route(path, post(create_coupon_handler).get(list_coupons_handler))
            .route(
                &format!("{}/{{id}}", path),
                get(get_coupon_handler).put(update_coupon_handler),
            );
    }
    router.with_state(state)
}

/// Health check handler
#[instrument(skip(state))]
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = match &state.stats {
        Some(handle) => Some(handle.snapshot().await),
        None => None,
    };
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: state.store.name().to_string(),
        stats,
    })
}

/// Create coupon handler. Assigns the coupon's identity.
#[instrument(skip(state, body))]
async fn create_coupon_handler(
    State(state): State<AppState>,
    body: Result<Json<Coupon>, JsonRejection>,
) -> Result<Json<Coupon>, ApiError> {
    let Json(mut coupon) = body.map_err(|rejection| {
        ApiError::BadRequest(format!("badly formed body: {}", rejection.body_text()))
    })?;
    coupon.assign_new_id();

    let stored = state.store.insert(coupon).await.map_err(|err| {
        error!(error = %err, "failed to store coupon");
        ApiError::from(err)
    })?;

    info!(id = %stored.id, "created coupon");
    Ok(Json(stored))
}

/// Get coupon handler. Any lookup failure is reported as 404.
#[instrument(skip(state))]
async fn get_coupon_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Coupon>, ApiError> {
    match state.store.get_by_id(&id).await {
        Ok(coupon) => Ok(Json(coupon)),
        Err(err) => {
            if err.is_not_found() {
                debug!("coupon not found");
            } else {
                warn!(error = %err, "coupon lookup failed");
            }
            Err(ApiError::NotFound(format!("coupon {} not found", id)))
        }
    }
}

/// List coupons handler, filtered by optional `brand` and `name` query parameters.
#[instrument(skip(state))]
async fn list_coupons_handler(
    State(state): State<AppState>,
    Query(filter): Query<CouponFilter>,
) -> Result<Json<Vec<Coupon>>, ApiError> {
    let filter = (!filter.is_empty()).then_some(filter);
    let coupons = state.store.list(filter.as_ref()).await.map_err(|err| {
        error!(error = %err, "error retrieving coupons from store");
        ApiError::from(err)
    })?;
    Ok(Json(coupons))
}

/// Update coupon handler. Updates are not supported.
#[instrument]
async fn update_coupon_handler(Path(id): Path<String>) -> ApiError {
    debug!(%id, "rejecting coupon update");
    ApiError::from(StoreError::Unsupported("update"))
}

/// Start the API server
pub async fn serve(config: ApiConfig, state: AppState) -> Result<(), std::io::Error> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting coupon API server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Coupon API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            // Without a signal handler, run until the process is killed.
            warn!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}
