use async_trait::async_trait;
use chrono::SubsecRound;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{RetentionRuleRepo, SINGLE_RECORD_FETCH_LIMIT, parse_rule_type, single_record},
    },
    models::{CreateRetentionRule, RetentionRule, RetentionRuleType, UpdateRetentionRule},
};

const RULE_COLUMNS: &str = "id, project_id, data_storage_name, dataset_name, type, \
    retention_period_in_days, version, is_active, updated_by, created_at, updated_at";

pub struct SqliteRetentionRuleRepo {
    pool: SqlitePool,
}

impl SqliteRetentionRuleRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn rule_from_row(row: &SqliteRow) -> DbResult<RetentionRule> {
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
}

#[async_trait]
impl RetentionRuleRepo for SqliteRetentionRuleRepo {
    async fn create(&self, input: CreateRetentionRule) -> DbResult<RetentionRule> {
        let now = chrono::Utc::now().trunc_subsecs(3);

        let result = sqlx::query(
            r#"
            INSERT INTO retention_rules (
                project_id, data_storage_name, dataset_name, type,
                retention_period_in_days, version, is_active, updated_by,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, 1, 1, ?, ?, ?)
            "#,
        )
        .bind(&input.project_id)
        .bind(&input.data_storage_name)
        .bind(&input.dataset_name)
        .bind(input.rule_type.as_str())
        .bind(input.retention_period_in_days)
        .bind(&input.updated_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
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

        Ok(RetentionRule {
            id: result.last_insert_rowid(),
            project_id: input.project_id,
            data_storage_name: input.data_storage_name,
            dataset_name: input.dataset_name,
            rule_type: input.rule_type,
            retention_period_in_days: input.retention_period_in_days,
            version: 1,
            is_active: true,
            updated_by: input.updated_by,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> DbResult<Option<RetentionRule>> {
        let query = format!("SELECT {} FROM retention_rules WHERE id = ?", RULE_COLUMNS);

        let result = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.as_ref().map(Self::rule_from_row).transpose()
    }

    async fn update(&self, id: i64, input: UpdateRetentionRule) -> DbResult<RetentionRule> {
        if input.is_empty() {
            return Err(DbError::Validation("nothing to update".into()));
        }
        let now = chrono::Utc::now().trunc_subsecs(3);

        // Build dynamic update query
        let mut set_clauses = vec!["updated_at = ?", "version = version + 1"];
        if input.retention_period_in_days.is_some() {
            set_clauses.push("retention_period_in_days = ?");
        }
        if input.dataset_name.is_some() {
            set_clauses.push("dataset_name = ?");
        }
        if input.updated_by.is_some() {
            set_clauses.push("updated_by = ?");
        }

        let query = format!(
            "UPDATE retention_rules SET {} WHERE id = ? AND is_active = 1",
            set_clauses.join(", ")
        );

        let mut query_builder = sqlx::query(&query).bind(now);
        if let Some(days) = input.retention_period_in_days {
            query_builder = query_builder.bind(days);
        }
        if let Some(ref dataset_name) = input.dataset_name {
            query_builder = query_builder.bind(dataset_name);
        }
        if let Some(ref updated_by) = input.updated_by {
            query_builder = query_builder.bind(updated_by);
        }

        let result = query_builder.bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
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
            WHERE is_active = 1 AND type = ? AND project_id = ? AND data_storage_name = ?
            LIMIT ?
            "#,
            RULE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(RetentionRuleType::Dataset.as_str())
            .bind(project_id)
            .bind(data_storage)
            .bind(SINGLE_RECORD_FETCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        single_record(
            rows.iter()
                .map(Self::rule_from_row)
                .collect::<DbResult<Vec<_>>>()?,
        )
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
            "AND is_active = 1"
        };

        let query = format!(
            r#"
            SELECT {}
            FROM retention_rules
            WHERE project_id = ? AND data_storage_name = ?
            {}
            LIMIT ?
            "#,
            RULE_COLUMNS, active_filter
        );

        let rows = sqlx::query(&query)
            .bind(project_id)
            .bind(data_storage_name)
            .bind(SINGLE_RECORD_FETCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        single_record(
            rows.iter()
                .map(Self::rule_from_row)
                .collect::<DbResult<Vec<_>>>()?,
        )
    }

    async fn soft_delete(&self, rule: &mut RetentionRule) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now().trunc_subsecs(3);

        let version: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE retention_rules
            SET is_active = 0, version = version + 1, updated_at = ?
            WHERE id = ? AND is_active = 1
            RETURNING version
            "#,
        )
        .bind(now)
        .bind(rule.id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(version) = version else {
            return Err(DbError::NotFound);
        };

        tx.commit().await?;

        rule.is_active = false;
        rule.version = version;
        rule.updated_at = now;

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
            WHERE is_active = 1 AND type = ? AND project_id = ?
            LIMIT ?
            "#,
            RULE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(RetentionRuleType::Global.as_str())
            .bind(project_id)
            .bind(SINGLE_RECORD_FETCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        single_record(
            rows.iter()
                .map(Self::rule_from_row)
                .collect::<DbResult<Vec<_>>>()?,
        )
    }

    async fn get_all_dataset_rule_project_ids(&self) -> DbResult<Vec<String>> {
        let project_ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT project_id
            FROM retention_rules
            WHERE is_active = 1 AND type = ?
            ORDER BY project_id
            "#,
        )
        .bind(RetentionRuleType::Dataset.as_str())
        .fetch_all(&self.pool)
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
            WHERE is_active = 1 AND type = ? AND project_id = ?
            ORDER BY id
            "#,
            RULE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(RetentionRuleType::Dataset.as_str())
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::rule_from_row).collect()
    }
}
