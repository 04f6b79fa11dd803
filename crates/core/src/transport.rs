//! Chat transport traits — the seam between the routers and the platform.
//!
//! Connection management, authentication, and presence all live behind
//! these traits. The stream router only needs a source of inbound DMs and
//! a sink for outbound replies.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::event::{InboundMessage, Reply};

/// A source of real-time inbound messages.
#[async_trait]
pub trait ChatStream: Send + Sync {
    /// Transport name, for logs.
    fn name(&self) -> &str;

    /// Start listening. Returns a receiver yielding inbound messages; the
    /// implementation handles its own connection lifecycle internally.
    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<InboundMessage, TransportError>>, TransportError>;

    /// Stop the stream gracefully.
    async fn stop(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A sink for outbound replies to a platform channel.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), TransportError>;

    async fn send_attachment(
        &self,
        channel_id: &str,
        text: Option<&str>,
        attachment: &serde_json::Value,
    ) -> Result<(), TransportError>;

    /// Send a single engine reply.
    async fn send(&self, channel_id: &str, reply: &Reply) -> Result<(), TransportError> {
        match reply {
            Reply::Text(text) => self.send_text(channel_id, text).await,
            Reply::Attachment { text, attachment } => {
                self.send_attachment(channel_id, text.as_deref(), attachment)
                    .await
            }
        }
    }
}
