//! The corvid decision core: template rendering and the interaction state
//! machine.
//!
//! Everything in this crate is pure decision logic. The state machine reads
//! a session snapshot and an inbound event and produces an [`Outcome`]
//! describing replies, session operations, and module dispatches; the
//! routers in `corvid-routers` execute those effects.

pub mod machine;
pub mod template;

pub use machine::{DialogEngine, ModuleDispatch, Outcome, SessionOp};
pub use template::TemplateRenderer;
