//! Shared tests for RetentionRuleRepo implementations

use crate::{
    db::{error::DbError, repos::RetentionRuleRepo},
    models::{
        CreateRetentionRule, GLOBAL_DEFAULT_PROJECT_ID, RetentionRuleType, UpdateRetentionRule,
    },
};

// ============================================================================
// Test Input Helpers
// ============================================================================

fn dataset_rule_input(project_id: &str, storage: &str, days: i32) -> CreateRetentionRule {
    CreateRetentionRule {
        project_id: project_id.to_string(),
        data_storage_name: Some(storage.to_string()),
        dataset_name: Some(format!("dataset for {}", storage)),
        rule_type: RetentionRuleType::Dataset,
        retention_period_in_days: days,
        updated_by: Some("tester@example.com".to_string()),
    }
}

fn global_rule_input(project_id: &str, days: i32) -> CreateRetentionRule {
    CreateRetentionRule {
        project_id: project_id.to_string(),
        data_storage_name: None,
        dataset_name: None,
        rule_type: RetentionRuleType::Global,
        retention_period_in_days: days,
        updated_by: None,
    }
}

// ============================================================================
// Shared Test Functions
// ============================================================================

pub async fn test_create_rule(repo: &dyn RetentionRuleRepo) {
    let rule = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");

    assert!(rule.id > 0);
    assert_eq!(rule.project_id, "project-a");
    assert_eq!(rule.data_storage_name.as_deref(), Some("gs://bucket-a"));
    assert_eq!(rule.rule_type, RetentionRuleType::Dataset);
    assert_eq!(rule.retention_period_in_days, 30);
    assert_eq!(rule.version, 1);
    assert!(rule.is_active);
}

pub async fn test_create_duplicate_active_rule_conflicts(repo: &dyn RetentionRuleRepo) {
    repo.create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create first rule");

    let result = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 60))
        .await;

    assert!(matches!(result, Err(DbError::Conflict(_))));
}

pub async fn test_create_duplicate_global_rule_conflicts(repo: &dyn RetentionRuleRepo) {
    repo.create(global_rule_input(GLOBAL_DEFAULT_PROJECT_ID, 365))
        .await
        .expect("Failed to create global rule");

    let result = repo
        .create(global_rule_input(GLOBAL_DEFAULT_PROJECT_ID, 30))
        .await;

    assert!(matches!(result, Err(DbError::Conflict(_))));
}

pub async fn test_get_by_id(repo: &dyn RetentionRuleRepo) {
    let created = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");

    let fetched = repo
        .get_by_id(created.id)
        .await
        .expect("Query failed")
        .expect("Rule not found");

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.project_id, created.project_id);
    assert_eq!(fetched.data_storage_name, created.data_storage_name);
    assert_eq!(fetched.dataset_name, created.dataset_name);
    assert_eq!(fetched.updated_by, created.updated_by);
}

pub async fn test_get_by_id_not_found(repo: &dyn RetentionRuleRepo) {
    let result = repo.get_by_id(999_999).await.expect("Query failed");
    assert!(result.is_none());
}

pub async fn test_find_dataset_rule_by_business_key(repo: &dyn RetentionRuleRepo) {
    let created = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");
    repo.create(dataset_rule_input("project-a", "gs://bucket-b", 30))
        .await
        .expect("Failed to create rule");

    let found = repo
        .find_dataset_rule_by_business_key("project-a", "gs://bucket-a")
        .await
        .expect("Query failed")
        .expect("Rule not found");
    assert_eq!(found.id, created.id);

    let wrong_project = repo
        .find_dataset_rule_by_business_key("project-b", "gs://bucket-a")
        .await
        .expect("Query failed");
    assert!(wrong_project.is_none());
}

pub async fn test_find_dataset_rule_ignores_other_types(repo: &dyn RetentionRuleRepo) {
    let mut input = dataset_rule_input("project-a", "gs://bucket-a", 30);
    input.rule_type = RetentionRuleType::Default;
    repo.create(input).await.expect("Failed to create rule");

    let found = repo
        .find_dataset_rule_by_business_key("project-a", "gs://bucket-a")
        .await
        .expect("Query failed");
    assert!(found.is_none());

    // The type-agnostic finder still sees it
    let any_type = repo
        .find_by_business_key("project-a", "gs://bucket-a")
        .await
        .expect("Query failed")
        .expect("Rule not found");
    assert_eq!(any_type.rule_type, RetentionRuleType::Default);
}

pub async fn test_find_by_business_key_excludes_deactivated(repo: &dyn RetentionRuleRepo) {
    let mut rule = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");

    repo.soft_delete(&mut rule)
        .await
        .expect("Failed to soft delete");

    let active_only = repo
        .find_by_business_key("project-a", "gs://bucket-a")
        .await
        .expect("Query failed");
    assert!(active_only.is_none());

    let including = repo
        .find_by_business_key_including_deactivated("project-a", "gs://bucket-a", true)
        .await
        .expect("Query failed")
        .expect("Deactivated rule not found");
    assert_eq!(including.id, rule.id);
    assert!(!including.is_active);
}

pub async fn test_find_by_business_key_including_deactivated_non_unique(
    repo: &dyn RetentionRuleRepo,
) {
    let mut old = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");
    repo.soft_delete(&mut old)
        .await
        .expect("Failed to soft delete");

    // A replacement rule may be created once the old one is inactive
    let current = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 90))
        .await
        .expect("Failed to create replacement rule");

    let active = repo
        .find_by_business_key("project-a", "gs://bucket-a")
        .await
        .expect("Query failed")
        .expect("Active rule not found");
    assert_eq!(active.id, current.id);

    let result = repo
        .find_by_business_key_including_deactivated("project-a", "gs://bucket-a", true)
        .await;
    assert!(matches!(result, Err(DbError::NonUnique)));
}

pub async fn test_soft_delete(repo: &dyn RetentionRuleRepo) {
    let mut rule = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");
    let original_id = rule.id;

    let id = repo
        .soft_delete(&mut rule)
        .await
        .expect("Failed to soft delete");

    assert_eq!(id, original_id);
    assert!(!rule.is_active);
    assert_eq!(rule.version, 2);

    // The row is kept, only deactivated
    let stored = repo
        .get_by_id(id)
        .await
        .expect("Query failed")
        .expect("Soft-deleted rule was physically removed");
    assert!(!stored.is_active);
    assert_eq!(stored.version, 2);
}

pub async fn test_soft_delete_not_found(repo: &dyn RetentionRuleRepo) {
    let mut rule = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");
    rule.id = 999_999;

    let result = repo.soft_delete(&mut rule).await;

    assert!(matches!(result, Err(DbError::NotFound)));
    assert!(rule.is_active);
}

pub async fn test_soft_delete_inactive_rule_not_found(repo: &dyn RetentionRuleRepo) {
    let mut rule = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");
    let mut stale = rule.clone();
    repo.soft_delete(&mut rule)
        .await
        .expect("Failed to soft delete");

    // A second delete through an older copy of the rule must not bump the version again
    let result = repo.soft_delete(&mut stale).await;
    assert!(matches!(result, Err(DbError::NotFound)));
    assert!(stale.is_active);
    assert_eq!(stale.version, 1);

    let stored = repo
        .get_by_id(rule.id)
        .await
        .expect("Query failed")
        .expect("Rule not found");
    assert!(!stored.is_active);
    assert_eq!(stored.version, 2);
}

pub async fn test_create_duplicate_default_rule_without_storage_conflicts(
    repo: &dyn RetentionRuleRepo,
) {
    let default_rule = || CreateRetentionRule {
        rule_type: RetentionRuleType::Default,
        ..global_rule_input("project-a", 30)
    };
    repo.create(default_rule())
        .await
        .expect("Failed to create default rule");

    let result = repo.create(default_rule()).await;
    assert!(matches!(result, Err(DbError::Conflict(_))));

    // A storage-scoped default rule for the same project is a different key
    let mut scoped = dataset_rule_input("project-a", "gs://bucket-a", 30);
    scoped.rule_type = RetentionRuleType::Default;
    repo.create(scoped)
        .await
        .expect("Failed to create storage-scoped default rule");
}

pub async fn test_find_global_rule_by_project_id(repo: &dyn RetentionRuleRepo) {
    let global = repo
        .create(global_rule_input(GLOBAL_DEFAULT_PROJECT_ID, 365))
        .await
        .expect("Failed to create global rule");
    let dataset = dataset_rule_input(GLOBAL_DEFAULT_PROJECT_ID, "gs://bucket-a", 30);
    repo.create(dataset)
        .await
        .expect("Failed to create dataset rule");

    let found = repo
        .find_global_rule_by_project_id(GLOBAL_DEFAULT_PROJECT_ID)
        .await
        .expect("Query failed")
        .expect("Global rule not found");
    assert_eq!(found.id, global.id);
    assert_eq!(found.rule_type, RetentionRuleType::Global);
    assert!(found.data_storage_name.is_none());

    let missing = repo
        .find_global_rule_by_project_id("project-without-global")
        .await
        .expect("Query failed");
    assert!(missing.is_none());
}

pub async fn test_find_global_rule_excludes_deactivated(repo: &dyn RetentionRuleRepo) {
    let mut global = repo
        .create(global_rule_input(GLOBAL_DEFAULT_PROJECT_ID, 365))
        .await
        .expect("Failed to create global rule");
    repo.soft_delete(&mut global)
        .await
        .expect("Failed to soft delete");

    let found = repo
        .find_global_rule_by_project_id(GLOBAL_DEFAULT_PROJECT_ID)
        .await
        .expect("Query failed");
    assert!(found.is_none());
}

pub async fn test_get_all_dataset_rule_project_ids(repo: &dyn RetentionRuleRepo) {
    repo.create(dataset_rule_input("project-b", "gs://bucket-1", 30))
        .await
        .expect("Failed to create rule");
    repo.create(dataset_rule_input("project-b", "gs://bucket-2", 30))
        .await
        .expect("Failed to create rule");
    repo.create(dataset_rule_input("project-a", "gs://bucket-3", 30))
        .await
        .expect("Failed to create rule");

    // Only inactive dataset rules: excluded
    let mut inactive = repo
        .create(dataset_rule_input("project-c", "gs://bucket-4", 30))
        .await
        .expect("Failed to create rule");
    repo.soft_delete(&mut inactive)
        .await
        .expect("Failed to soft delete");

    // Only a global rule: excluded
    repo.create(global_rule_input("project-d", 365))
        .await
        .expect("Failed to create global rule");

    let project_ids = repo
        .get_all_dataset_rule_project_ids()
        .await
        .expect("Query failed");

    assert_eq!(project_ids, vec!["project-a", "project-b"]);
}

pub async fn test_get_all_dataset_rule_project_ids_empty(repo: &dyn RetentionRuleRepo) {
    let project_ids = repo
        .get_all_dataset_rule_project_ids()
        .await
        .expect("Query failed");
    assert!(project_ids.is_empty());
}

pub async fn test_find_dataset_rules_by_project_id(repo: &dyn RetentionRuleRepo) {
    let first = repo
        .create(dataset_rule_input("project-a", "gs://bucket-1", 30))
        .await
        .expect("Failed to create rule");
    let second = repo
        .create(dataset_rule_input("project-a", "gs://bucket-2", 60))
        .await
        .expect("Failed to create rule");
    let mut removed = repo
        .create(dataset_rule_input("project-a", "gs://bucket-3", 90))
        .await
        .expect("Failed to create rule");
    repo.soft_delete(&mut removed)
        .await
        .expect("Failed to soft delete");
    repo.create(global_rule_input("project-a", 365))
        .await
        .expect("Failed to create global rule");
    repo.create(dataset_rule_input("project-b", "gs://bucket-1", 30))
        .await
        .expect("Failed to create rule");

    let rules = repo
        .find_dataset_rules_by_project_id("project-a")
        .await
        .expect("Query failed");

    let ids: Vec<i64> = rules.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert!(rules.iter().all(|r| r.is_active));
    assert!(
        rules
            .iter()
            .all(|r| r.rule_type == RetentionRuleType::Dataset)
    );
}

pub async fn test_update_rule(repo: &dyn RetentionRuleRepo) {
    let created = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");

    let updated = repo
        .update(
            created.id,
            UpdateRetentionRule {
                retention_period_in_days: Some(45),
                dataset_name: None,
                updated_by: Some("other@example.com".to_string()),
            },
        )
        .await
        .expect("Failed to update rule");

    assert_eq!(updated.retention_period_in_days, 45);
    assert_eq!(updated.dataset_name, created.dataset_name);
    assert_eq!(updated.updated_by.as_deref(), Some("other@example.com"));
    assert_eq!(updated.version, 2);
    assert!(updated.updated_at >= created.updated_at);
}

pub async fn test_update_deactivated_rule_fails(repo: &dyn RetentionRuleRepo) {
    let mut rule = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");
    repo.soft_delete(&mut rule)
        .await
        .expect("Failed to soft delete");

    let result = repo
        .update(
            rule.id,
            UpdateRetentionRule {
                retention_period_in_days: Some(45),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(DbError::NotFound)));
}

pub async fn test_update_not_found(repo: &dyn RetentionRuleRepo) {
    let input = UpdateRetentionRule {
        retention_period_in_days: Some(45),
        ..Default::default()
    };
    let result = repo.update(999_999, input).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

pub async fn test_update_without_changes_rejected(repo: &dyn RetentionRuleRepo) {
    let created = repo
        .create(dataset_rule_input("project-a", "gs://bucket-a", 30))
        .await
        .expect("Failed to create rule");

    let result = repo
        .update(created.id, UpdateRetentionRule::default())
        .await;
    assert!(matches!(result, Err(DbError::Validation(_))));

    let stored = repo
        .get_by_id(created.id)
        .await
        .expect("Query failed")
        .expect("Rule not found");
    assert_eq!(stored.version, 1);
}

// ============================================================================
// SQLite Tests
// ============================================================================

#[cfg(feature = "database-sqlite")]
mod sqlite_tests {
    use crate::db::tests::harness;

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let db = harness::sqlite_db().await;
                super::$name(&*db.retention_rules()).await;
            }
        };
    }

    sqlite_test!(test_create_rule);
    sqlite_test!(test_create_duplicate_active_rule_conflicts);
    sqlite_test!(test_create_duplicate_global_rule_conflicts);
    sqlite_test!(test_get_by_id);
    sqlite_test!(test_get_by_id_not_found);
    sqlite_test!(test_find_dataset_rule_by_business_key);
    sqlite_test!(test_find_dataset_rule_ignores_other_types);
    sqlite_test!(test_find_by_business_key_excludes_deactivated);
    sqlite_test!(test_find_by_business_key_including_deactivated_non_unique);
    sqlite_test!(test_soft_delete);
    sqlite_test!(test_soft_delete_not_found);
    sqlite_test!(test_soft_delete_inactive_rule_not_found);
    sqlite_test!(test_create_duplicate_default_rule_without_storage_conflicts);
    sqlite_test!(test_find_global_rule_by_project_id);
    sqlite_test!(test_find_global_rule_excludes_deactivated);
    sqlite_test!(test_get_all_dataset_rule_project_ids);
    sqlite_test!(test_get_all_dataset_rule_project_ids_empty);
    sqlite_test!(test_find_dataset_rules_by_project_id);
    sqlite_test!(test_update_rule);
    sqlite_test!(test_update_deactivated_rule_fails);
    sqlite_test!(test_update_not_found);
    sqlite_test!(test_update_without_changes_rejected);
}

// ============================================================================
// PostgreSQL Tests - Require Docker, run with `cargo test -- --ignored`
// ============================================================================

#[cfg(feature = "database-postgres")]
mod postgres_tests {
    use crate::db::tests::harness::postgres::postgres_db;

    macro_rules! postgres_test {
        ($name:ident) => {
            #[tokio::test]
            #[ignore = "Requires Docker - run with `cargo test -- --ignored`"]
            async fn $name() {
                let db = postgres_db().await;
                super::$name(&*db.retention_rules()).await;
            }
        };
    }

    postgres_test!(test_create_rule);
    postgres_test!(test_create_duplicate_active_rule_conflicts);
    postgres_test!(test_create_duplicate_global_rule_conflicts);
    postgres_test!(test_get_by_id);
    postgres_test!(test_get_by_id_not_found);
    postgres_test!(test_find_dataset_rule_by_business_key);
    postgres_test!(test_find_dataset_rule_ignores_other_types);
    postgres_test!(test_find_by_business_key_excludes_deactivated);
    postgres_test!(test_find_by_business_key_including_deactivated_non_unique);
    postgres_test!(test_soft_delete);
    postgres_test!(test_soft_delete_not_found);
    postgres_test!(test_soft_delete_inactive_rule_not_found);
    postgres_test!(test_create_duplicate_default_rule_without_storage_conflicts);
    postgres_test!(test_find_global_rule_by_project_id);
    postgres_test!(test_find_global_rule_excludes_deactivated);
    postgres_test!(test_get_all_dataset_rule_project_ids);
    postgres_test!(test_get_all_dataset_rule_project_ids_empty);
    postgres_test!(test_find_dataset_rules_by_project_id);
    postgres_test!(test_update_rule);
    postgres_test!(test_update_deactivated_rule_fails);
    postgres_test!(test_update_not_found);
    postgres_test!(test_update_without_changes_rejected);
}
