//! Retention rule endpoints.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use axum_valid::{Valid, ValidRejection};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::{
    AppState,
    db::DbPool,
    models::{CreateRetentionRule, RetentionRule, UpdateRetentionRule},
};

/// Query identifying a rule by its business key.
#[derive(Debug, Deserialize)]
pub struct BusinessKeyQuery {
    pub project_id: String,
    pub data_storage_name: String,
    /// Also consider deactivated rules
    #[serde(default)]
    pub include_deactivated: bool,
}

#[derive(Debug, Deserialize)]
pub struct DatasetKeyQuery {
    pub project_id: String,
    pub data_storage_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

/// Response body of a soft delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedRule {
    pub id: i64,
}

/// Validated JSON body. Rejections are turned into [`ApiError`] by the handler.
type ValidatedJson<T> = Result<Valid<Json<T>>, ValidRejection<JsonRejection>>;

fn get_db(state: &AppState) -> Result<&DbPool, ApiError> {
    state.db.as_deref().ok_or(ApiError::DatabaseRequired)
}

/// Create a retention rule.
#[tracing::instrument(
    name = "retention_rules.create",
    skip_all,
    fields(project_id = tracing::field::Empty, rule_type = tracing::field::Empty)
)]
pub async fn create(
    State(state): State<AppState>,
    payload: ValidatedJson<CreateRetentionRule>,
) -> Result<(StatusCode, Json<RetentionRule>), ApiError> {
    let Valid(Json(input)) = payload?;
    let span = tracing::Span::current();
    span.record("project_id", input.project_id.as_str());
    span.record("rule_type", input.rule_type.as_str());

    let db = get_db(&state)?;
    let rule = db.retention_rules().create(input).await?;

    tracing::info!(rule_id = rule.id, "Retention rule created");
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Get a retention rule by id, active or not.
#[tracing::instrument(name = "retention_rules.get", skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RetentionRule>, ApiError> {
    let db = get_db(&state)?;

    let rule = db
        .retention_rules()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Retention rule '{}' not found", id)))?;

    Ok(Json(rule))
}

/// Update an active retention rule.
#[tracing::instrument(name = "retention_rules.update", skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: ValidatedJson<UpdateRetentionRule>,
) -> Result<Json<RetentionRule>, ApiError> {
    let Valid(Json(input)) = payload?;
    let db = get_db(&state)?;
    let rule = db.retention_rules().update(id, input).await?;

    tracing::info!(version = rule.version, "Retention rule updated");
    Ok(Json(rule))
}

/// Soft delete an active retention rule.
#[tracing::instrument(name = "retention_rules.delete", skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedRule>, ApiError> {
    let db = get_db(&state)?;
    let repo = db.retention_rules();

    let mut rule = repo
        .get_by_id(id)
        .await?
        .filter(|rule| rule.is_active)
        .ok_or_else(|| ApiError::NotFound(format!("Retention rule '{}' not found", id)))?;

    let id = repo.soft_delete(&mut rule).await?;

    tracing::info!(version = rule.version, "Retention rule deactivated");
    Ok(Json(DeletedRule { id }))
}

/// Find a rule by `(project_id, data_storage_name)`.
#[tracing::instrument(
    name = "retention_rules.find_by_business_key",
    skip(state, query),
    fields(project_id = %query.project_id, include_deactivated = query.include_deactivated)
)]
pub async fn find_by_business_key(
    State(state): State<AppState>,
    Query(query): Query<BusinessKeyQuery>,
) -> Result<Json<RetentionRule>, ApiError> {
    let db = get_db(&state)?;
    let repo = db.retention_rules();

    let rule = if query.include_deactivated {
        repo.find_by_business_key_including_deactivated(
            &query.project_id,
            &query.data_storage_name,
            true,
        )
        .await?
    } else {
        repo.find_by_business_key(&query.project_id, &query.data_storage_name)
            .await?
    };

    rule.map(Json).ok_or_else(|| {
        ApiError::NotFound(format!(
            "No retention rule for project '{}' and '{}'",
            query.project_id, query.data_storage_name
        ))
    })
}

/// Find the active dataset rule for a project and storage location.
#[tracing::instrument(
    name = "retention_rules.find_dataset_rule",
    skip(state, query),
    fields(project_id = %query.project_id)
)]
pub async fn find_dataset_rule(
    State(state): State<AppState>,
    Query(query): Query<DatasetKeyQuery>,
) -> Result<Json<RetentionRule>, ApiError> {
    let db = get_db(&state)?;

    db.retention_rules()
        .find_dataset_rule_by_business_key(&query.project_id, &query.data_storage_name)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No dataset rule for project '{}' and '{}'",
                query.project_id, query.data_storage_name
            ))
        })
}

/// Find the active global rule of a project.
#[tracing::instrument(name = "retention_rules.find_global_rule", skip(state))]
pub async fn find_global_rule(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<RetentionRule>, ApiError> {
    let db = get_db(&state)?;

    db.retention_rules()
        .find_global_rule_by_project_id(&project_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("No global rule for project '{}'", project_id))
        })
}

/// List the active dataset rules of a project.
#[tracing::instrument(name = "retention_rules.list_dataset_rules", skip(state))]
pub async fn list_dataset_rules(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ListResponse<RetentionRule>>, ApiError> {
    let db = get_db(&state)?;
    let data = db
        .retention_rules()
        .find_dataset_rules_by_project_id(&project_id)
        .await?;

    Ok(Json(ListResponse { data }))
}

/// List projects that own at least one active dataset rule.
#[tracing::instrument(name = "retention_rules.list_dataset_rule_projects", skip(state))]
pub async fn list_dataset_rule_projects(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<String>>, ApiError> {
    let db = get_db(&state)?;
    let data = db.retention_rules().get_all_dataset_rule_project_ids().await?;

    Ok(Json(ListResponse { data }))
}
