//! Session field names and lifetimes.
//!
//! A session is a flat field map persisted in the store under the
//! conversation key. The field names here are the wire format — they must
//! stay stable across releases because in-flight sessions survive restarts.

use std::collections::HashMap;
use std::time::Duration;

/// A session snapshot: the raw field map read from the store.
/// An empty map is the canonical "no active session" signal.
pub type SessionFields = HashMap<String, String>;

/// The interaction the session is currently waiting on.
pub const FIELD_INTERACTION: &str = "interaction";
/// Word that cancels the whole interaction when sent verbatim.
pub const FIELD_STOP_WORD: &str = "stop_word";
pub const FIELD_USER_ID: &str = "userid";
pub const FIELD_USERNAME: &str = "username";
/// The current interaction's type (`text`, `attachment`, `final_text`).
pub const FIELD_TYPE: &str = "type";
pub const FIELD_NEXT_INTERACTION: &str = "next_interaction";
/// Set instead of the interaction fields for a sub-term dialog.
pub const FIELD_SEARCH_TERM: &str = "searchTerm";

/// Prefix for recorded answers: `response:<interactionID>`.
pub const RESPONSE_PREFIX: &str = "response:";

/// The sentinel `next_interaction` value marking the final step.
pub const NEXT_END: &str = "end";

/// How long a full interaction session lives. The platform's interactive
/// message window is 30 minutes, so we expire slightly earlier. Set only at
/// creation, never refreshed — this bounds total interaction wall-clock time
/// regardless of pace.
pub const INTERACTION_TTL: Duration = Duration::from_secs(29 * 60);

/// How long a sub-term dialog session lives. These are a single round trip,
/// so the window is much shorter.
pub const SUBTERM_TTL: Duration = Duration::from_secs(5 * 60);

/// Build the store field name for a recorded answer.
pub fn response_field(interaction_id: &str) -> String {
    format!("{RESPONSE_PREFIX}{interaction_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_field_format() {
        assert_eq!(response_field("q1"), "response:q1");
    }

    #[test]
    fn ttl_ordering() {
        assert!(SUBTERM_TTL < INTERACTION_TTL);
    }
}
