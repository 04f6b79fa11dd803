//! The interactive-callback router.
//!
//! Handles parsed webhook callbacks (button clicks, menu selections) and
//! produces the body of the immediate HTTP response. The HTTP layer itself
//! lives in `corvid-gateway`.

use std::sync::Arc;

use corvid_core::error::Error;
use corvid_core::event::{Reply, SelectionEvent};
use corvid_core::module::ModuleRegistry;
use corvid_core::store::SessionStore;
use corvid_engine::DialogEngine;
use serde::Serialize;
use tracing::info;

use crate::effects::{apply_ops, run_modules};
use crate::locks::KeyLocks;

/// The JSON body returned to the platform in direct response to a callback.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackReply {
    pub text: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<serde_json::Value>,

    pub replace_original: bool,

    pub response_type: String,
}

impl CallbackReply {
    /// Flatten engine replies into one response body: text parts joined,
    /// attachments carried alongside.
    fn from_replies(replies: &[Reply], replace_original: bool) -> Self {
        let mut text_parts = Vec::new();
        let mut attachments = Vec::new();
        for reply in replies {
            match reply {
                Reply::Text(t) => text_parts.push(t.clone()),
                Reply::Attachment { text, attachment } => {
                    if let Some(t) = text {
                        text_parts.push(t.clone());
                    }
                    attachments.push(attachment.clone());
                }
            }
        }
        Self {
            text: text_parts.join("\n"),
            attachments,
            replace_original,
            response_type: "in_channel".to_string(),
        }
    }
}

pub struct CallbackRouter {
    engine: Arc<DialogEngine>,
    store: Arc<dyn SessionStore>,
    modules: Arc<ModuleRegistry>,
    locks: Arc<KeyLocks>,
}

impl CallbackRouter {
    pub fn new(
        engine: Arc<DialogEngine>,
        store: Arc<dyn SessionStore>,
        modules: Arc<ModuleRegistry>,
        locks: Arc<KeyLocks>,
    ) -> Self {
        Self {
            engine,
            store,
            modules,
            locks,
        }
    }

    /// Handle one selection end to end and build the HTTP response body.
    pub async fn handle(&self, event: &SelectionEvent) -> Result<CallbackReply, Error> {
        let key = event.key.storage_key();
        let _guard = self.locks.acquire(&key).await;

        let session = self.store.get(&key).await?;
        let outcome = self
            .engine
            .on_selection(&session, &event.callback_id, &event.value)?;

        apply_ops(self.store.as_ref(), &key, &outcome.ops).await?;

        info!(
            key = %event.key,
            interaction = %event.callback_id,
            value = %event.value,
            "Handled interaction callback"
        );

        if let Some(dispatch) = &outcome.dispatch {
            run_modules(&self.modules, dispatch).await;
        }

        Ok(CallbackReply::from_replies(
            &outcome.replies,
            outcome.replace_original,
        ))
    }
}
