//! Dispatch routers for corvid.
//!
//! Two independent entry points mutate the same keyed session records: the
//! real-time message stream ([`StreamRouter`]) and the interactive-callback
//! webhook ([`CallbackRouter`]). Both translate platform events into the
//! state machine's abstract shapes, run the engine, and execute the
//! resulting effects. A shared [`KeyLocks`] registry serializes the
//! read-modify-write sequence per conversation key so the two entry points
//! cannot interleave on one conversation within a process.

pub mod callback;
pub mod effects;
pub mod locks;
pub mod slack;
pub mod stream;

pub use callback::{CallbackReply, CallbackRouter};
pub use locks::KeyLocks;
pub use slack::{SlackApiSink, SlackRtmTransport};
pub use stream::StreamRouter;
