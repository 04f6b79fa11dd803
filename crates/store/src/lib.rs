//! Session store implementations for corvid.
//!
//! The store holds in-flight conversation state so interactions survive
//! process restarts and are shared by both entry points. Keys expire on a
//! TTL set at session creation; an expired key simply stops existing and
//! the next inbound event is treated as a fresh message.

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use memory::MemoryStore;

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
