//! The real-time message-stream router.
//!
//! Consumes inbound direct messages from a [`ChatStream`], runs the state
//! machine under the conversation key's lock, and executes the resulting
//! effects: session writes, replies through the [`ChatSink`], and module
//! dispatches.

use std::sync::Arc;

use corvid_core::error::{Error, TransportError};
use corvid_core::event::{InboundMessage, SenderRef};
use corvid_core::module::ModuleRegistry;
use corvid_core::store::SessionStore;
use corvid_core::transport::ChatSink;
use corvid_engine::DialogEngine;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::effects::{apply_ops, run_modules};
use crate::locks::KeyLocks;

/// The platform's internal announcement bot; we never answer it.
const PLATFORM_BOT_USER: &str = "USLACKBOT";

pub struct StreamRouter {
    engine: Arc<DialogEngine>,
    store: Arc<dyn SessionStore>,
    sink: Arc<dyn ChatSink>,
    modules: Arc<ModuleRegistry>,
    locks: Arc<KeyLocks>,
}

impl StreamRouter {
    pub fn new(
        engine: Arc<DialogEngine>,
        store: Arc<dyn SessionStore>,
        sink: Arc<dyn ChatSink>,
        modules: Arc<ModuleRegistry>,
        locks: Arc<KeyLocks>,
    ) -> Self {
        Self {
            engine,
            store,
            sink,
            modules,
            locks,
        }
    }

    /// Whether the bot should answer this message at all: humans only, and
    /// only in direct-message channels.
    pub fn should_respond(msg: &InboundMessage) -> bool {
        // We don't talk to bots - it could be ourselves
        if msg.user_id.is_empty() && msg.bot_id.is_some() {
            debug!("Ignoring message from a bot");
            return false;
        }
        // Not from a user OR a bot?
        if msg.user_id.is_empty() && msg.bot_id.is_none() {
            debug!("Ignoring message with no sender");
            return false;
        }
        if msg.user_id == PLATFORM_BOT_USER {
            debug!("Ignoring the platform bot");
            return false;
        }
        if !msg.key.channel_id.starts_with('D') {
            debug!("Ignoring non-DM channel");
            return false;
        }
        true
    }

    /// Consume the stream until it closes. Per-conversation failures are
    /// logged and dropped; the loop keeps serving other keys.
    pub async fn run(&self, mut rx: mpsc::Receiver<Result<InboundMessage, TransportError>>) {
        info!("Stream router running");
        while let Some(event) = rx.recv().await {
            match event {
                Ok(msg) => {
                    if let Err(e) = self.handle(&msg).await {
                        error!(key = %msg.key, error = %e, "Failed to handle message");
                    }
                }
                Err(e) => error!(error = %e, "Stream transport error"),
            }
        }
        info!("Stream closed, router stopping");
    }

    /// Handle one inbound message end to end.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<(), Error> {
        if !Self::should_respond(msg) {
            return Ok(());
        }

        let key = msg.key.storage_key();
        let _guard = self.locks.acquire(&key).await;

        let session = self.store.get(&key).await?;
        let sender = SenderRef {
            user_id: msg.user_id.clone(),
            username: msg.username.clone(),
        };
        let outcome = self.engine.on_message(&session, &sender, &msg.text)?;

        apply_ops(self.store.as_ref(), &key, &outcome.ops).await?;

        for reply in &outcome.replies {
            self.sink.send(&msg.key.channel_id, reply).await?;
        }

        if let Some(dispatch) = &outcome.dispatch {
            run_modules(&self.modules, dispatch).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use corvid_core::event::{ConversationKey, Reply};
    use corvid_store::MemoryStore;
    use tokio::sync::Mutex;

    struct RecordingSink {
        sent: Mutex<Vec<(String, Reply)>>,
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), TransportError> {
            self.sent
                .lock()
                .await
                .push((channel_id.to_string(), Reply::text(text)));
            Ok(())
        }

        async fn send_attachment(
            &self,
            channel_id: &str,
            text: Option<&str>,
            attachment: &serde_json::Value,
        ) -> Result<(), TransportError> {
            self.sent.lock().await.push((
                channel_id.to_string(),
                Reply::Attachment {
                    text: text.map(String::from),
                    attachment: attachment.clone(),
                },
            ));
            Ok(())
        }
    }

    fn router(doc: &str) -> (StreamRouter, Arc<MemoryStore>, Arc<RecordingSink>) {
        let catalog = Arc::new(corvid_rules::parse(doc).unwrap());
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink {
            sent: Mutex::new(Vec::new()),
        });
        let router = StreamRouter::new(
            Arc::new(DialogEngine::new(catalog)),
            store.clone(),
            sink.clone(),
            Arc::new(corvid_modules::default_registry()),
            Arc::new(KeyLocks::new()),
        );
        (router, store, sink)
    }

    fn dm(text: &str) -> InboundMessage {
        InboundMessage {
            key: ConversationKey::new("T1", "D1"),
            user_id: "U123".into(),
            bot_id: None,
            username: "Alice".into(),
            text: text.into(),
        }
    }

    const SIGNUP_DOC: &str = r#"{
        "rules": [
            {
                "terms": ["signup"],
                "interaction_start": "q1",
                "interactions": [
                    {"interaction_id": "q1", "stop_word": "stop", "type": "text", "question": "Name?", "next_interaction": "end"}
                ]
            }
        ],
        "default": "dunno"
    }"#;

    #[test]
    fn dm_gate() {
        let mut msg = dm("hi");
        assert!(StreamRouter::should_respond(&msg));

        msg.user_id = String::new();
        msg.bot_id = Some("B1".into());
        assert!(!StreamRouter::should_respond(&msg));

        msg.bot_id = None;
        assert!(!StreamRouter::should_respond(&msg));

        let mut msg = dm("hi");
        msg.user_id = PLATFORM_BOT_USER.into();
        assert!(!StreamRouter::should_respond(&msg));

        let mut msg = dm("hi");
        msg.key = ConversationKey::new("T1", "C1");
        assert!(!StreamRouter::should_respond(&msg));
    }

    #[tokio::test]
    async fn end_to_end_signup_flow() {
        let (router, store, sink) = router(SIGNUP_DOC);

        router.handle(&dm("I want to signup")).await.unwrap();
        let session = store.get("T1:D1").await.unwrap();
        assert_eq!(session.get("interaction").map(String::as_str), Some("q1"));
        assert_eq!(
            sink.sent.lock().await.last(),
            Some(&("D1".to_string(), Reply::text("Name?")))
        );

        router.handle(&dm("Alice")).await.unwrap();
        assert!(store.get("T1:D1").await.unwrap().is_empty());
        assert_eq!(
            sink.sent.lock().await.last(),
            Some(&(
                "D1".to_string(),
                Reply::text("Thanks! We'll get back to you soon")
            ))
        );
    }

    #[tokio::test]
    async fn unmatched_message_gets_default() {
        let (router, _store, sink) = router(SIGNUP_DOC);
        router.handle(&dm("good morning")).await.unwrap();
        assert_eq!(
            sink.sent.lock().await.last(),
            Some(&("D1".to_string(), Reply::text("dunno")))
        );
    }

    #[tokio::test]
    async fn non_dm_is_ignored() {
        let (router, _store, sink) = router(SIGNUP_DOC);
        let mut msg = dm("signup");
        msg.key = ConversationKey::new("T1", "C42");
        router.handle(&msg).await.unwrap();
        assert!(sink.sent.lock().await.is_empty());
    }
}
