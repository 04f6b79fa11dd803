//! Built-in end-of-interaction modules for corvid.
//!
//! Modules run after a dialog completes, carrying the answers somewhere
//! useful. They are statically linked and registered explicitly at startup;
//! there is no runtime plugin discovery.

pub mod debug;
pub mod slack_webhook;

pub use debug::DebugModule;
pub use slack_webhook::SlackWebhookModule;

use corvid_core::module::ModuleRegistry;

/// Create the default module registry with all built-in modules.
pub fn default_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register(Box::new(DebugModule));
    registry.register(Box::new(SlackWebhookModule::new()));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtins() {
        let registry = default_registry();
        assert!(registry.get("DebugModule").is_some());
        assert!(registry.get("SlackWebhookModule").is_some());
    }
}
