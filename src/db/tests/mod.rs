//! Repository tests shared by both backends.
//!
//! Each test is written once against `&dyn RetentionRuleRepo`. SQLite runs
//! in memory on every `cargo test`; the Postgres copies need Docker and are
//! `#[ignore]`d, run them with `cargo test -- --ignored`.

mod retention_rules;
