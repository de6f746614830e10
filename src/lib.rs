//! Retention rule service.
//!
//! Stores dataset, global and default retention rules for Cloud Storage
//! locations and serves them over a JSON API. Every response carries the
//! `correlation-uuid` header of the request that produced it.

pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
#[cfg(feature = "server")]
pub mod observability;
pub mod routes;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no database is configured; only health routes are mounted then.
    pub db: Option<Arc<db::DbPool>>,
}

impl AppState {
    /// Connect to the configured database, running migrations when enabled.
    pub async fn new(config: &config::ServiceConfig) -> db::DbResult<Self> {
        if config.database.is_none() {
            tracing::warn!("No database configured; retention rule routes are disabled");
            return Ok(Self { db: None });
        }

        let pool = db::DbPool::from_config(&config.database).await?;
        if config.database.migrate_on_start() {
            pool.run_migrations().await?;
        }

        Ok(Self {
            db: Some(Arc::new(pool)),
        })
    }
}

/// Build the application router.
///
/// The correlation request filter is the outermost of the two correlation
/// layers so the response filter always finds the stored value.
pub fn build_app(config: &config::ServiceConfig, state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness));

    if state.db.is_some() {
        app = app.nest(&config.server.api_base_path, routes::get_api_routes());
    }

    // Layers run in reverse order of addition
    app.layer(axum::middleware::from_fn(
        middleware::correlation_response_filter,
    ))
    .layer(axum::middleware::from_fn(
        middleware::correlation_request_filter,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
    .with_state(state)
}
