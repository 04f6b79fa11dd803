//! Effect execution shared by both routers: applying session operations and
//! running end-of-interaction modules.

use corvid_core::error::StoreError;
use corvid_core::module::ModuleRegistry;
use corvid_core::store::SessionStore;
use corvid_engine::{ModuleDispatch, SessionOp};
use tracing::{debug, warn};

/// Apply the engine's session operations in order.
pub async fn apply_ops(
    store: &dyn SessionStore,
    key: &str,
    ops: &[SessionOp],
) -> Result<(), StoreError> {
    for op in ops {
        match op {
            SessionOp::Create { fields, ttl } => {
                store.set_fields(key, fields, Some(*ttl)).await?;
            }
            SessionOp::Set { fields } => {
                store.set_fields(key, fields, None).await?;
            }
            SessionOp::Delete => {
                store.delete(key).await?;
            }
        }
    }
    Ok(())
}

/// Run every module a completed dialog names.
///
/// A missing module name is a warning, not a failure: the other modules
/// still run, and the user-facing completion reply has already been sent.
pub async fn run_modules(registry: &ModuleRegistry, dispatch: &ModuleDispatch) {
    for name in &dispatch.modules {
        let Some(module) = registry.get(name) else {
            warn!(module = %name, "Referenced module not found");
            continue;
        };

        debug!(module = %name, "Running end-of-interaction module");
        let env = ModuleRegistry::resolve_env(module);
        if let Err(e) = module
            .run(&dispatch.payload, &env, &dispatch.questions)
            .await
        {
            warn!(module = %name, error = %e, "Error running module");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use corvid_core::error::ModuleError;
    use corvid_core::module::Module;
    use corvid_core::session::SessionFields;
    use corvid_store::MemoryStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn ops_apply_in_order() {
        let store = MemoryStore::new();
        let ops = vec![
            SessionOp::Create {
                fields: vec![("interaction".into(), "q1".into())],
                ttl: Duration::from_secs(60),
            },
            SessionOp::Set {
                fields: vec![("response:q1".into(), "yes".into())],
            },
        ];
        apply_ops(&store, "T1:D1", &ops).await.unwrap();
        let fields = store.get("T1:D1").await.unwrap();
        assert_eq!(fields.get("response:q1").map(String::as_str), Some("yes"));

        apply_ops(&store, "T1:D1", &[SessionOp::Delete]).await.unwrap();
        assert!(store.get("T1:D1").await.unwrap().is_empty());
    }

    struct CountingModule {
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Module for CountingModule {
        fn name(&self) -> &str {
            "CountingModule"
        }
        fn env_vars(&self) -> &[&str] {
            &[]
        }
        async fn run(
            &self,
            _payload: &SessionFields,
            _env: &HashMap<String, String>,
            _questions: &HashMap<String, String>,
        ) -> Result<(), ModuleError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ModuleError::RunFailed {
                    module: "CountingModule".into(),
                    reason: "boom".into(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_module_does_not_stop_others() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(CountingModule {
            runs: runs.clone(),
            fail: false,
        }));

        let dispatch = ModuleDispatch {
            modules: vec!["Ghost".into(), "CountingModule".into()],
            payload: SessionFields::new(),
            questions: HashMap::new(),
        };
        run_modules(&registry, &dispatch).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_module_is_swallowed() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(CountingModule {
            runs: runs.clone(),
            fail: true,
        }));

        let dispatch = ModuleDispatch {
            modules: vec!["CountingModule".into()],
            payload: SessionFields::new(),
            questions: HashMap::new(),
        };
        // Must not panic or propagate.
        run_modules(&registry, &dispatch).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
