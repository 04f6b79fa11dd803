//! Debug module — logs the completed payload instead of shipping it
//! anywhere. Handy while writing a rule document.

use async_trait::async_trait;
use std::collections::HashMap;

use corvid_core::error::ModuleError;
use corvid_core::module::Module;
use corvid_core::session::SessionFields;
use tracing::info;

pub struct DebugModule;

#[async_trait]
impl Module for DebugModule {
    fn name(&self) -> &str {
        "DebugModule"
    }

    fn env_vars(&self) -> &[&str] {
        &[]
    }

    async fn run(
        &self,
        payload: &SessionFields,
        env: &HashMap<String, String>,
        questions: &HashMap<String, String>,
    ) -> Result<(), ModuleError> {
        info!(payload = ?payload, env = ?env, "DebugModule running");
        for (id, question) in questions {
            let answer = payload
                .get(&corvid_core::session::response_field(id))
                .map(String::as_str)
                .unwrap_or("<no answer>");
            info!(interaction = %id, question = %question, answer = %answer, "Recorded answer");
        }
        Ok(())
    }
}
