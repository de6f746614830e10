use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{RetentionRuleRepo, SINGLE_RECORD_FETCH_LIMIT, parse_rule_type, single_record},
    },
    models::{CreateRetentionRule, RetentionRule, RetentionRuleType, UpdateRetentionRule},
};

const RULE_COLUMNS: &str = "id, project_id, data_storage_name, dataset_name, type, \
    retention_period_in_days, version, is_active, updated_by, created_at, updated_at";

pub struct PostgresRetentionRuleRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresRetentionRuleRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }

    fn rule_from_row(row: &PgRow) -> DbResult<RetentionRule> {
        Ok(RetentionRule {
            id: row.get("id"),
            project_id: row.get("project_id"),
            data_storage_name: row.get("data_storage_name"),
            dataset_name: row.get("dataset_name"),
            rule_type: parse_rule_type(&row.get::<String, _>("type"))?,
            retention_period_in_days: row.get("retention_period_in_days"),
            version: row.get("version"),
            is_active: row.get("is_active"),
            updated_by: row.get("updated_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn fetch_single(&self, query: &str, binds: &[&str]) -> DbResult<Option<RetentionRule>> {
        let mut query_builder = sqlx::query(query);
        for value in binds {
            query_builder = query_builder.bind(*value);
        }

        let rows = query_builder
            .bind(SINGLE_RECORD_FETCH_LIMIT)
            .fetch_all(&self.read_pool)
            .await?;

        single_record(
            rows.iter()
                .map(Self::rule_from_row)
                .collect::<DbResult<Vec<_>>>()?,
        )
    }
}

#[async_trait]
impl RetentionRuleRepo for PostgresRetentionRuleRepo {
    async fn create(&self, input: CreateRetentionRule) -> DbResult<RetentionRule> {
        let query = format!(
            r#"
            INSERT INTO retention_rules (
                project_id, data_storage_name, dataset_name, type,
                retention_period_in_days, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            RULE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&input.project_id)
            .bind(&input.data_storage_name)
            .bind(&input.dataset_name)
            .bind(input.rule_type.as_str())
            .bind(input.retention_period_in_days)
            .bind(&input.updated_by)
            .fetch_one(&self.write_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    DbError::Conflict(format!(
                        "An active {} rule already exists for project '{}'{}",
                        input.rule_type,
                        input.project_id,
                        input
                            .data_storage_name
                            .as_deref()
                            .map(|s| format!(" and '{}'", s))
                            .unwrap_or_default()
                    ))
                }
                _ => DbError::from(e),
            })?;

        Self::rule_from_row(&row)
    }

    async fn get_by_id(&self, id: i64) -> DbResult<Option<RetentionRule>> {
        let query = format!("SELECT {} FROM retention_rules WHERE id = $1", RULE_COLUMNS);

        let result = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.read_pool)
            .await?;

        result.as_ref().map(Self::rule_from_row).transpose()
    }

    async fn update(&self, id: i64, input: UpdateRetentionRule) -> DbResult<RetentionRule> {
        if input.is_empty() {
            return Err(DbError::Validation("nothing to update".into()));
        }
        let query = format!(
            r#"
            UPDATE retention_rules SET
                retention_period_in_days = COALESCE($1, retention_period_in_days),
                dataset_name = COALESCE($2, dataset_name),
                updated_by = COALESCE($3, updated_by),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $4 AND is_active
            RETURNING {}
            "#,
            RULE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(input.retention_period_in_days)
            .bind(&input.dataset_name)
            .bind(&input.updated_by)
            .bind(id)
            .fetch_optional(&self.write_pool)
            .await?
            .ok_or(DbError::NotFound)?;

        Self::rule_from_row(&row)
    }

    async fn find_dataset_rule_by_business_key(
        &self,
        project_id: &str,
        data_storage: &str,
    ) -> DbResult<Option<RetentionRule>> {
        let query = format!(
            r#"
            SELECT {}
            FROM retention_rules
            WHERE is_active AND type = $1 AND project_id = $2 AND data_storage_name = $3
            LIMIT $4
            "#,
            RULE_COLUMNS
        );

        let rule_type = RetentionRuleType::Dataset.as_str();
        self.fetch_single(&query, &[rule_type, project_id, data_storage])
            .await
    }

    async fn find_by_business_key_including_deactivated(
        &self,
        project_id: &str,
        data_storage_name: &str,
        include_deactivated: bool,
    ) -> DbResult<Option<RetentionRule>> {
        let active_filter = if include_deactivated {
            ""
        } else {
            "AND is_active"
        };

        let query = format!(
            r#"
            SELECT {}
            FROM retention_rules
            WHERE project_id = $1 AND data_storage_name = $2
            {}
            LIMIT $3
            "#,
            RULE_COLUMNS, active_filter
        );

        self.fetch_single(&query, &[project_id, data_storage_name])
            .await
    }

    async fn soft_delete(&self, rule: &mut RetentionRule) -> DbResult<i64> {
        let mut tx = self.write_pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE retention_rules
            SET is_active = FALSE, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING version, updated_at
            "#,
        )
        .bind(rule.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        tx.commit().await?;

        rule.is_active = false;
        rule.version = row.get("version");
        rule.updated_at = row.get::<DateTime<Utc>, _>("updated_at");

        Ok(rule.id)
    }

    async fn find_global_rule_by_project_id(
        &self,
        project_id: &str,
    ) -> DbResult<Option<RetentionRule>> {
        let query = format!(
            r#"
            SELECT {}
            FROM retention_rules
            WHERE is_active AND type = $1 AND project_id = $2
            LIMIT $3
            "#,
            RULE_COLUMNS
        );

        self.fetch_single(&query, &[RetentionRuleType::Global.as_str(), project_id])
            .await
    }

    async fn get_all_dataset_rule_project_ids(&self) -> DbResult<Vec<String>> {
        let project_ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT project_id
            FROM retention_rules
            WHERE is_active AND type = $1
            ORDER BY project_id
            "#,
        )
        .bind(RetentionRuleType::Dataset.as_str())
        .fetch_all(&self.read_pool)
        .await?;

        Ok(project_ids)
    }

    async fn find_dataset_rules_by_project_id(
        &self,
        project_id: &str,
    ) -> DbResult<Vec<RetentionRule>> {
        let query = format!(
            r#"
            SELECT {}
            FROM retention_rules
            WHERE is_active AND type = $1 AND project_id = $2
            ORDER BY id
            "#,
            RULE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(RetentionRuleType::Dataset.as_str())
            .bind(project_id)
            .fetch_all(&self.read_pool)
            .await?;

        rows.iter().map(Self::rule_from_row).collect()
    }
}
