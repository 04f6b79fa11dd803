pub mod modules;
pub mod rules;
pub mod serve;
pub mod start;
pub mod web;

use std::sync::Arc;

use corvid_core::module::ModuleRegistry;
use corvid_core::store::SessionStore;
use corvid_engine::DialogEngine;
use corvid_routers::KeyLocks;
use corvid_store::RedisStore;
use tracing::info;

use crate::RuntimeOpts;

/// The shared pieces both entry points are wired from.
pub struct Runtime {
    pub engine: Arc<DialogEngine>,
    pub store: Arc<dyn SessionStore>,
    pub modules: Arc<ModuleRegistry>,
    pub locks: Arc<KeyLocks>,
}

impl Runtime {
    pub async fn build(opts: &RuntimeOpts) -> Result<Self, Box<dyn std::error::Error>> {
        let catalog = corvid_rules::load(&opts.rules)?;
        info!(path = %opts.rules, rules = catalog.rules.len(), "Rule catalog loaded");

        let store = RedisStore::connect(&opts.redis_url).await?;
        info!(url = %opts.redis_url, "Session store connected");

        let modules = corvid_modules::default_registry();
        info!(modules = modules.len(), "Dialog modules registered");

        Ok(Self {
            engine: Arc::new(DialogEngine::new(Arc::new(catalog))),
            store: Arc::new(store),
            modules: Arc::new(modules),
            locks: Arc::new(KeyLocks::new()),
        })
    }
}
