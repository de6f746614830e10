mod retention_rule;
mod validators;

pub use retention_rule::*;
