//! Error types for the corvid domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all corvid operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Rule document errors (fatal at startup) ---
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    // --- Session store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- State machine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Template rendering errors ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- End-of-interaction module errors ---
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    // --- Chat transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Configuration-time failures in the rule document. All of these are fatal:
/// the process must refuse to serve traffic on an inconsistent catalog.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to read rule file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode rule document: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Duplicate interaction ID found: {0}")]
    DuplicateInteractionId(String),

    #[error("interaction_start '{start}' does not name an interaction in its rule")]
    UnknownInteractionStart { start: String },

    #[error("Attachment callback_id doesn't match the interaction_id: {interaction_id}")]
    CallbackIdMismatch { interaction_id: String },

    #[error("A rule declares both interactions and subterms (terms: {terms:?})")]
    InteractionsAndSubTerms { terms: Vec<String> },
}

/// Failures talking to the session store. Scoped to the single in-flight
/// conversation; the process keeps serving other keys.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Read failed for key '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("Write failed for key '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("Delete failed for key '{key}': {reason}")]
    Delete { key: String, reason: String },
}

/// State machine faults. A dangling reference should have been caught at
/// load time; hitting one at runtime aborts only the current conversation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No interaction found with ID '{0}'")]
    DanglingInteraction(String),

    #[error("No rule found owning search term '{0}'")]
    DanglingSearchTerm(String),
}

/// Template rendering failures — recovered locally by callers, which fall
/// back to the unrendered text rather than dropping the reply.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template render failed: {0}")]
    Render(String),
}

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Module run failed: {module} — {reason}")]
    RunFailed { module: String, reason: String },

    #[error("Module misconfigured: {module} — {reason}")]
    Misconfigured { module: String, reason: String },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport not started: {0}")]
    NotStarted(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Transport connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid callback payload: {0}")]
    InvalidPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_error_displays_correctly() {
        let err = Error::Rules(RulesError::DuplicateInteractionId("q1".into()));
        assert!(err.to_string().contains("q1"));
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn store_error_displays_correctly() {
        let err = Error::Store(StoreError::Write {
            key: "T1:D1".into(),
            reason: "connection reset".into(),
        });
        assert!(err.to_string().contains("T1:D1"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn engine_error_displays_correctly() {
        let err = EngineError::DanglingInteraction("q9".into());
        assert!(err.to_string().contains("q9"));
    }
}
