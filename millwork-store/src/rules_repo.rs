use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, RwLock as AsyncRwLock};
use tracing::{debug, info};

use millwork_catalog::{PricingRule, PricingRuleSource, RuleError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed rule data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pricing rule #{index} is invalid: {source}")]
    InvalidRule {
        index: usize,
        #[source]
        source: RuleError,
    },
}

/// Persistence for the ordered pricing rule list edited from settings
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn load_rules(&self) -> Result<Vec<PricingRule>, StoreError>;

    /// Replace the whole list. Every rule is validated first; nothing is
    /// written when one fails.
    async fn save_rules(&self, rules: &[PricingRule]) -> Result<(), StoreError>;
}

fn validate_all(rules: &[PricingRule]) -> Result<(), StoreError> {
    for (idx, rule) in rules.iter().enumerate() {
        rule.validate()
            .map_err(|source| StoreError::InvalidRule { index: idx + 1, source })?;
    }
    Ok(())
}

/// Rules kept as a JSON array on disk
pub struct FileRuleRepository {
    path: PathBuf,
    // one writer at a time owns the temp file
    write_lock: Mutex<()>,
}

impl FileRuleRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleRepository for FileRuleRepository {
    async fn load_rules(&self) -> Result<Vec<PricingRule>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No rules file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let rules: Vec<PricingRule> = serde_json::from_slice(&bytes)?;
        info!("Loaded {} pricing rules from {}", rules.len(), self.path.display());
        Ok(rules)
    }

    async fn save_rules(&self, rules: &[PricingRule]) -> Result<(), StoreError> {
        validate_all(rules)?;

        let body = serde_json::to_vec_pretty(rules)?;
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // write-then-rename so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!("Saved {} pricing rules to {}", rules.len(), self.path.display());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: AsyncRwLock<Vec<PricingRule>>,
}

impl InMemoryRuleRepository {
    pub fn new(rules: Vec<PricingRule>) -> Self {
        Self { rules: AsyncRwLock::new(rules) }
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn load_rules(&self) -> Result<Vec<PricingRule>, StoreError> {
        Ok(self.rules.read().await.clone())
    }

    async fn save_rules(&self, rules: &[PricingRule]) -> Result<(), StoreError> {
        validate_all(rules)?;
        *self.rules.write().await = rules.to_vec();
        Ok(())
    }
}

/// Shared in-process copy of the active rules. Feeds the synchronous
/// evaluator while the repository behind it is async.
#[derive(Clone, Default)]
pub struct RuleSnapshot {
    rules: Arc<RwLock<Vec<PricingRule>>>,
}

impl RuleSnapshot {
    pub fn new(rules: Vec<PricingRule>) -> Self {
        Self { rules: Arc::new(RwLock::new(rules)) }
    }

    pub fn replace(&self, rules: Vec<PricingRule>) {
        let mut guard = self.rules.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = rules;
    }

    /// Reload from `repo`, keeping the current rules if the load fails.
    pub async fn refresh(&self, repo: &dyn RuleRepository) -> Result<usize, StoreError> {
        let rules = repo.load_rules().await?;
        let count = rules.len();
        self.replace(rules);
        Ok(count)
    }
}

impl PricingRuleSource for RuleSnapshot {
    fn pricing_rules(&self) -> Vec<PricingRule> {
        self.rules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
