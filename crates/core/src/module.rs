//! Module trait — the capability contract for end-of-interaction modules.
//!
//! A module is an external side-effect handler invoked once a dialog
//! completes: email the answers somewhere, post them to another webhook,
//! log them. The core never discovers modules dynamically — they are
//! registered explicitly in a [`ModuleRegistry`] constructed at startup and
//! passed by reference to the routers.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ModuleError;
use crate::session::SessionFields;

/// The capability contract for an end-of-interaction module.
#[async_trait]
pub trait Module: Send + Sync {
    /// The unique name of this module, as referenced by a rule's
    /// `interaction_end_mods`.
    fn name(&self) -> &str;

    /// Environment variable names this module needs. The caller resolves
    /// each as `<MODULE_NAME>_<VAR>` (uppercased) from the process
    /// environment before invocation.
    fn env_vars(&self) -> &[&str];

    /// Run the module with the completed interaction's full field map,
    /// the resolved environment, and the interaction-id → question map for
    /// the owning rule.
    async fn run(
        &self,
        payload: &SessionFields,
        env: &HashMap<String, String>,
        questions: &HashMap<String, String>,
    ) -> Result<(), ModuleError>;
}

/// A registry of available modules, looked up by name at dialog completion.
pub struct ModuleRegistry {
    modules: HashMap<String, Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Register a module. Replaces any existing module with the same name.
    pub fn register(&mut self, module: Box<dyn Module>) {
        let name = module.name().to_string();
        self.modules.insert(name, module);
    }

    /// Get a module by name.
    pub fn get(&self, name: &str) -> Option<&dyn Module> {
        self.modules.get(name).map(|m| m.as_ref())
    }

    /// List all registered module names.
    pub fn names(&self) -> Vec<&str> {
        self.modules.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Resolve a module's declared env vars from the process environment.
    /// Names are `<MODULE_NAME>_<VAR>`, uppercased. Unset vars resolve to
    /// an empty string, matching the flat map modules receive.
    pub fn resolve_env(module: &dyn Module) -> HashMap<String, String> {
        let mut env = HashMap::new();
        for var in module.env_vars() {
            let adjusted = format!("{}_{}", module.name(), var).to_uppercase();
            let value = std::env::var(&adjusted).unwrap_or_default();
            env.insert(adjusted, value);
        }
        env
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoModule;

    #[async_trait]
    impl Module for EchoModule {
        fn name(&self) -> &str {
            "EchoModule"
        }

        fn env_vars(&self) -> &[&str] {
            &["One", "Two"]
        }

        async fn run(
            &self,
            _payload: &SessionFields,
            _env: &HashMap<String, String>,
            _questions: &HashMap<String, String>,
        ) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(EchoModule));
        assert!(registry.get("EchoModule").is_some());
        assert!(registry.get("Nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn env_resolution_uppercases_names() {
        // SAFETY: test-local env mutation; no other test reads this var.
        unsafe { std::env::set_var("ECHOMODULE_ONE", "1") };
        let env = ModuleRegistry::resolve_env(&EchoModule);
        assert_eq!(env.get("ECHOMODULE_ONE").map(String::as_str), Some("1"));
        // Unset vars still appear, empty
        assert!(env.contains_key("ECHOMODULE_TWO"));
        unsafe { std::env::remove_var("ECHOMODULE_ONE") };
    }
}
