pub mod app_config;
pub mod rules_repo;

pub use rules_repo::{FileRuleRepository, InMemoryRuleRepository, RuleRepository, RuleSnapshot, StoreError};
