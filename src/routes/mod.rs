mod error;
pub mod health;
pub mod retention_rules;

use axum::{
    Router,
    routing::{get, post},
};
pub use error::{ApiError, ErrorInfo, ErrorResponse};

use crate::AppState;

/// Retention rule API routes, nested under the configured base path.
pub fn get_api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/retention-rules",
            post(retention_rules::create).get(retention_rules::find_by_business_key),
        )
        .route(
            "/retention-rules/dataset",
            get(retention_rules::find_dataset_rule),
        )
        .route(
            "/retention-rules/global/{project_id}",
            get(retention_rules::find_global_rule),
        )
        .route(
            "/retention-rules/{id}",
            get(retention_rules::get)
                .patch(retention_rules::update)
                .delete(retention_rules::delete),
        )
        .route(
            "/projects/{project_id}/dataset-rules",
            get(retention_rules::list_dataset_rules),
        )
        .route(
            "/dataset-rule-projects",
            get(retention_rules::list_dataset_rule_projects),
        )
}
