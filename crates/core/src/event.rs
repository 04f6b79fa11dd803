//! Inbound and outbound event shapes shared by both dispatch routers.
//!
//! The message-stream router and the webhook callback router each translate
//! platform payloads into these types before the state machine sees them.

use serde::{Deserialize, Serialize};

/// The conversation key: one in-flight dialog per `(team, channel)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub team_id: String,
    pub channel_id: String,
}

impl ConversationKey {
    pub fn new(team_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            channel_id: channel_id.into(),
        }
    }

    /// The session-store key: `<teamID>:<channelID>`.
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.team_id, self.channel_id)
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.team_id, self.channel_id)
    }
}

/// The user who triggered an event. Bound into templates as
/// `Username` / `UserID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderRef {
    pub user_id: String,
    pub username: String,
}

/// A message arriving on the real-time stream.
///
/// `user_id` may be empty and `bot_id` set when the sender is another bot;
/// the stream router's DM gate filters those out before the engine runs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub key: ConversationKey,
    pub user_id: String,
    pub bot_id: Option<String>,
    pub username: String,
    pub text: String,
}

/// A selection event from the interactive-callback webhook: the user picked
/// a button or menu value for the interaction named by `callback_id`.
#[derive(Debug, Clone)]
pub struct SelectionEvent {
    pub key: ConversationKey,
    pub callback_id: String,
    pub value: String,
}

/// One outbound message produced by a state transition.
///
/// Attachments are opaque rich-content payloads, passed through to the
/// platform unmodified.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Attachment {
        text: Option<String>,
        attachment: serde_json::Value,
    },
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}
