use std::sync::LazyLock;

use regex::Regex;

/// Regex for GCP-style project ids (lowercase alphanumeric with hyphens).
/// Examples: "my-project", "global-default", "sdrs-prod-123"
pub static PROJECT_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*[a-z0-9]$").unwrap());

/// Regex for Cloud Storage locations: `gs://bucket` with an optional object prefix.
pub static DATA_STORAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^gs://[a-z0-9][a-z0-9._-]{1,220}[a-z0-9](/.*)?$").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_regex() {
        assert!(PROJECT_ID_REGEX.is_match("global-default"));
        assert!(PROJECT_ID_REGEX.is_match("sdrs-prod-123"));
        assert!(!PROJECT_ID_REGEX.is_match("Upper-Case"));
        assert!(!PROJECT_ID_REGEX.is_match("trailing-"));
        assert!(!PROJECT_ID_REGEX.is_match("1starts-with-digit"));
    }

    #[test]
    fn test_data_storage_regex() {
        assert!(DATA_STORAGE_REGEX.is_match("gs://my-bucket"));
        assert!(DATA_STORAGE_REGEX.is_match("gs://my-bucket/some/prefix"));
        assert!(!DATA_STORAGE_REGEX.is_match("gs://"));
        assert!(!DATA_STORAGE_REGEX.is_match("s3://my-bucket"));
        assert!(!DATA_STORAGE_REGEX.is_match("my-bucket"));
    }
}
