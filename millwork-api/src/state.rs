use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use millwork_catalog::{Catalog, PresetValues};
use millwork_order::OrderManager;
use millwork_store::{RuleRepository, RuleSnapshot};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub rules: RuleSnapshot,
    pub rule_repo: Arc<dyn RuleRepository>,
    /// Held across persisting rules and swapping the live snapshot
    pub rules_write: Arc<Mutex<()>>,
    pub presets: Arc<RwLock<PresetValues>>,
    pub catalog: Arc<RwLock<Catalog>>,
    pub orders: Arc<Mutex<OrderManager>>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        rules: RuleSnapshot,
        rule_repo: Arc<dyn RuleRepository>,
        presets: PresetValues,
        auth: AuthConfig,
    ) -> Self {
        Self {
            rules,
            rule_repo,
            rules_write: Arc::new(Mutex::new(())),
            presets: Arc::new(RwLock::new(presets)),
            catalog: Arc::new(RwLock::new(Catalog::default())),
            orders: Arc::new(Mutex::new(OrderManager::new())),
            auth,
        }
    }
}
