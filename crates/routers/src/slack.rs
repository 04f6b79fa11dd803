//! Slack transport adapters.
//!
//! `SlackRtmTransport` implements `ChatStream` for the real-time message
//! feed. In production this would hold a WebSocket to Slack's Socket Mode
//! API; currently a stub with in-process injection. `SlackApiSink` posts
//! replies through the Web API and is fully functional.

use async_trait::async_trait;
use corvid_core::error::TransportError;
use corvid_core::event::InboundMessage;
use corvid_core::transport::{ChatSink, ChatStream};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Real-time message stream (stub).
pub struct SlackRtmTransport {
    bot_token: String,
    inject_tx: tokio::sync::Mutex<Option<mpsc::Sender<Result<InboundMessage, TransportError>>>>,
}

impl SlackRtmTransport {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            inject_tx: tokio::sync::Mutex::new(None),
        }
    }

    /// Inject a message as if it came off the socket (for testing).
    pub async fn inject_message(&self, msg: InboundMessage) -> Result<(), TransportError> {
        let guard = self.inject_tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx
                .send(Ok(msg))
                .await
                .map_err(|_| TransportError::ConnectionLost("Message channel closed".into())),
            None => Err(TransportError::NotStarted("Stream not started".into())),
        }
    }
}

#[async_trait]
impl ChatStream for SlackRtmTransport {
    fn name(&self) -> &str {
        "slack-rtm"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<InboundMessage, TransportError>>, TransportError> {
        if self.bot_token.is_empty() {
            return Err(TransportError::NotStarted("Bot token is empty".into()));
        }
        info!("Slack RTM stream starting (stub mode)");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn stop(&self) -> Result<(), TransportError> {
        info!("Slack RTM stream stopping");
        *self.inject_tx.lock().await = None;
        Ok(())
    }
}

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Outbound reply sink backed by the Slack Web API.
pub struct SlackApiSink {
    client: reqwest::Client,
    bot_token: String,
}

impl SlackApiSink {
    pub fn new(bot_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            bot_token: bot_token.into(),
        }
    }

    async fn post(&self, body: serde_json::Value) -> Result<(), TransportError> {
        let channel = body["channel"].as_str().unwrap_or_default().to_string();
        debug!(channel = %channel, "Posting message");
        let resp = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::DeliveryFailed {
                channel: channel.clone(),
                reason: e.to_string(),
            })?;
        resp.error_for_status()
            .map_err(|e| TransportError::DeliveryFailed {
                channel,
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ChatSink for SlackApiSink {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), TransportError> {
        self.post(json!({ "channel": channel_id, "text": text }))
            .await
    }

    async fn send_attachment(
        &self,
        channel_id: &str,
        text: Option<&str>,
        attachment: &serde_json::Value,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "channel": channel_id,
            "attachments": [attachment],
        });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.post(body).await
    }
}
