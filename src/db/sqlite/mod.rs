mod retention_rules;

pub use retention_rules::SqliteRetentionRuleRepo;
