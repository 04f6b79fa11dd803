//! # Corvid Core
//!
//! Domain types, traits, and error definitions for the corvid dialog engine.
//! Everything stateful or platform-facing is a trait here — the session
//! store, the chat transports, the end-of-interaction modules — and the
//! implementations live in their own crates, so every other crate depends
//! inward on this one and nothing else.

pub mod error;
pub mod event;
pub mod module;
pub mod session;
pub mod store;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{ConversationKey, InboundMessage, Reply, SelectionEvent, SenderRef};
pub use module::{Module, ModuleRegistry};
pub use session::{SessionFields, INTERACTION_TTL, SUBTERM_TTL};
pub use store::SessionStore;
pub use transport::{ChatSink, ChatStream};
