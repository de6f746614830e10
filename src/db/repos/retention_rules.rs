use async_trait::async_trait;

use crate::{
    db::error::{DbError, DbResult},
    models::{CreateRetentionRule, RetentionRule, RetentionRuleType, UpdateRetentionRule},
};

/// Persistence for retention rules.
///
/// Rules are never physically deleted: [`RetentionRuleRepo::soft_delete`] clears
/// `is_active` and every finder except `get_by_id` and
/// `find_by_business_key_including_deactivated(.., true)` only sees active rows.
#[async_trait]
pub trait RetentionRuleRepo: Send + Sync {
    async fn create(&self, input: CreateRetentionRule) -> DbResult<RetentionRule>;
    async fn get_by_id(&self, id: i64) -> DbResult<Option<RetentionRule>>;
    /// Update an active rule, bumping its version.
    ///
    /// Input without any field set is rejected with [`DbError::Validation`].
    async fn update(&self, id: i64, input: UpdateRetentionRule) -> DbResult<RetentionRule>;

    /// Get the active dataset rule for a project and a `gs://bucket` location.
    async fn find_dataset_rule_by_business_key(
        &self,
        project_id: &str,
        data_storage: &str,
    ) -> DbResult<Option<RetentionRule>>;

    /// Get the active rule identified by its business key, of any type.
    async fn find_by_business_key(
        &self,
        project_id: &str,
        data_storage_name: &str,
    ) -> DbResult<Option<RetentionRule>> {
        self.find_by_business_key_including_deactivated(project_id, data_storage_name, false)
            .await
    }

    /// Get the rule identified by its business key.
    ///
    /// With `include_deactivated` the active filter is dropped, so a key with
    /// history (one active and older inactive rows) is reported as non-unique.
    async fn find_by_business_key_including_deactivated(
        &self,
        project_id: &str,
        data_storage_name: &str,
        include_deactivated: bool,
    ) -> DbResult<Option<RetentionRule>>;

    /// Deactivate the rule inside a transaction and return its id.
    ///
    /// On success the passed entity reflects the stored state (`is_active`,
    /// `version`, `updated_at`). A rule that is missing or already inactive
    /// yields [`DbError::NotFound`] and is left untouched.
    async fn soft_delete(&self, rule: &mut RetentionRule) -> DbResult<i64>;

    async fn find_global_rule_by_project_id(
        &self,
        project_id: &str,
    ) -> DbResult<Option<RetentionRule>>;

    /// Distinct ids of projects owning at least one active dataset rule, ascending.
    async fn get_all_dataset_rule_project_ids(&self) -> DbResult<Vec<String>>;

    async fn find_dataset_rules_by_project_id(
        &self,
        project_id: &str,
    ) -> DbResult<Vec<RetentionRule>>;
}

/// Parse the stored `type` column.
pub(crate) fn parse_rule_type(s: &str) -> DbResult<RetentionRuleType> {
    s.parse()
        .map_err(|e: String| DbError::Internal(format!("Invalid rule type in database: {}", e)))
}
