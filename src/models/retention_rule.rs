use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::validators::{DATA_STORAGE_REGEX, PROJECT_ID_REGEX};

/// Project id conventionally owning the global retention rule.
pub const GLOBAL_DEFAULT_PROJECT_ID: &str = "global-default";

/// Scope a retention rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RetentionRuleType {
    /// Applies to a single dataset (a bucket or a prefix inside one).
    Dataset,
    /// Applies to every dataset without a more specific rule.
    Global,
    Default,
}

impl RetentionRuleType {
    /// Database representation of the rule type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionRuleType::Dataset => "DATASET",
            RetentionRuleType::Global => "GLOBAL",
            RetentionRuleType::Default => "DEFAULT",
        }
    }
}

impl fmt::Display for RetentionRuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetentionRuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DATASET" => Ok(RetentionRuleType::Dataset),
            "GLOBAL" => Ok(RetentionRuleType::Global),
            "DEFAULT" => Ok(RetentionRuleType::Default),
            other => Err(format!("unknown retention rule type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionRule {
    pub id: i64,
    pub project_id: String,
    /// Storage location of the form `gs://bucket[/path]`. Absent for global rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_storage_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: RetentionRuleType,
    pub retention_period_in_days: i32,
    pub version: i32,
    /// Soft-delete flag. Deactivated rules are kept for history.
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_rule"))]
pub struct CreateRetentionRule {
    /// GCP project the rule belongs to
    #[validate(length(min = 1, max = 255), regex(path = *PROJECT_ID_REGEX))]
    pub project_id: String,
    /// `gs://bucket[/path]`, required for dataset rules
    #[validate(length(min = 6, max = 1024), regex(path = *DATA_STORAGE_REGEX))]
    pub data_storage_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub dataset_name: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: RetentionRuleType,
    #[validate(range(min = 0))]
    pub retention_period_in_days: i32,
    #[validate(length(min = 1, max = 255))]
    pub updated_by: Option<String>,
}

fn validate_create_rule(input: &CreateRetentionRule) -> Result<(), ValidationError> {
    match (input.rule_type, &input.data_storage_name) {
        (RetentionRuleType::Dataset, None) => {
            let mut err = ValidationError::new("missing_data_storage_name");
            err.message = Some("Dataset rules require a data_storage_name".into());
            Err(err)
        }
        (RetentionRuleType::Global, Some(_)) => {
            let mut err = ValidationError::new("unexpected_data_storage_name");
            err.message = Some("Global rules cannot target a data_storage_name".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_rule"))]
pub struct UpdateRetentionRule {
    #[validate(range(min = 0))]
    pub retention_period_in_days: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub dataset_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub updated_by: Option<String>,
}

impl UpdateRetentionRule {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.retention_period_in_days.is_none()
            && self.dataset_name.is_none()
            && self.updated_by.is_none()
    }
}

fn validate_update_rule(input: &UpdateRetentionRule) -> Result<(), ValidationError> {
    if input.is_empty() {
        let mut err = ValidationError::new("empty_update");
        err.message = Some("At least one field must be provided".into());
        return Err(err);
    }
    Ok(())
}
