//! Liveness and readiness endpoints. Only the rule store is checked.

use std::time::Instant;

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::{AppState, db::DbPool};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok` or `degraded`.
    pub status: &'static str,
    pub version: &'static str,
    /// Absent when the service runs without a rule store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseHealth>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn check_database(db: &DbPool) -> DatabaseHealth {
    let started = Instant::now();
    let result = db.ping().await;
    let latency_ms = started.elapsed().as_millis() as u64;
    if let Err(err) = &result {
        tracing::warn!(error = %err, "Rule store is unreachable");
    }
    DatabaseHealth {
        reachable: result.is_ok(),
        latency_ms,
        error: result.err().map(|_| "rule store unreachable".to_string()),
    }
}

#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db {
        Some(db) => Some(check_database(db).await),
        None => None,
    };
    let healthy = database.as_ref().is_none_or(|d| d.reachable);

    let report = HealthReport {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// 503 while the rule store is unreachable.
#[tracing::instrument(name = "health.readiness", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let ready = match &state.db {
        Some(db) => db.ping().await.is_ok(),
        None => true,
    };
    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body};
    use http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServiceConfig;

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health_without_database() {
        let app = crate::build_app(&ServiceConfig::default(), AppState { db: None });
        let (status, json) = get(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json.get("database").is_none());

        assert_eq!(get(&app, "/health/live").await.0, StatusCode::OK);
        assert_eq!(get(&app, "/health/ready").await.0, StatusCode::OK);
    }

    #[tokio::test]
    #[cfg(feature = "database-sqlite")]
    async fn test_health_reports_database() {
        use std::sync::Arc;

        let db = crate::db::tests::harness::sqlite_db().await;
        let state = AppState {
            db: Some(Arc::new(db)),
        };
        let app = crate::build_app(&ServiceConfig::default(), state);
        let (status, json) = get(&app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["database"]["reachable"], true);
        assert!(json["database"]["latency_ms"].is_u64());
        assert!(json["database"].get("error").is_none());
        assert_eq!(get(&app, "/health/ready").await.0, StatusCode::OK);
    }
}
