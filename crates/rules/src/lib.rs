//! Rule catalog for the corvid dialog engine.
//!
//! The catalog is loaded once at startup from a declarative JSON document,
//! validated for internal consistency, and shared read-only for the process
//! lifetime. Every failure mode here is configuration-time: validating
//! eagerly means the engine can never produce an inconsistent session
//! mid-conversation.

mod catalog;
mod loader;

pub use catalog::{
    DynamicNext, Interaction, InteractionKind, Rule, RuleCatalog, SubTerm,
};
pub use loader::{load, parse};
