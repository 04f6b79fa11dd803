//! Rule document loading and validation.
//!
//! All validations are fatal at load time, never at runtime: a catalog that
//! passes `parse` can be served for the life of the process without ever
//! producing a dangling reference mid-conversation.

use std::path::Path;

use corvid_core::error::RulesError;
use tracing::info;

use crate::catalog::RuleCatalog;

/// Load and validate a rule document from disk.
pub fn load(path: impl AsRef<Path>) -> Result<RuleCatalog, RulesError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog = parse(&raw)?;
    info!(
        path = %path.display(),
        rules = catalog.rules.len(),
        "Loaded rule catalog"
    );
    Ok(catalog)
}

/// Parse and validate a rule document from a JSON string.
pub fn parse(raw: &str) -> Result<RuleCatalog, RulesError> {
    let mut catalog: RuleCatalog =
        serde_json::from_str(raw).map_err(RulesError::Decode)?;

    // Search terms are matched case-insensitively; normalize once here so
    // the hot path only lowercases the message.
    for rule in &mut catalog.rules {
        for term in &mut rule.search_terms {
            *term = term.to_lowercase();
        }
        for sub in &mut rule.subterms {
            for term in &mut sub.search_terms {
                *term = term.to_lowercase();
            }
        }
    }

    validate(&catalog)?;
    Ok(catalog)
}

fn validate(catalog: &RuleCatalog) -> Result<(), RulesError> {
    // Interaction IDs must be unique across the whole catalog: the webhook
    // callback_id is the only correlation between a click and its step.
    let mut seen = std::collections::HashSet::new();
    for rule in &catalog.rules {
        for interaction in &rule.interactions {
            if !seen.insert(interaction.interaction_id.as_str()) {
                return Err(RulesError::DuplicateInteractionId(
                    interaction.interaction_id.clone(),
                ));
            }
        }
    }

    for rule in &catalog.rules {
        // interaction_start must name an interaction present in its rule.
        if !rule.interactions.is_empty() {
            let start = rule.interaction_start.as_deref().unwrap_or("");
            if rule.interaction(start).is_none() {
                return Err(RulesError::UnknownInteractionStart {
                    start: start.to_string(),
                });
            }
        }

        // An attachment's own callback identifier must equal the
        // interaction's id, or webhook correlation becomes ambiguous.
        for interaction in &rule.interactions {
            if let Some(attachment) = &interaction.attachment {
                let callback_id = attachment
                    .get("callback_id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("");
                if callback_id != interaction.interaction_id {
                    return Err(RulesError::CallbackIdMismatch {
                        interaction_id: interaction.interaction_id.clone(),
                    });
                }
            }
        }

        // Interactions and sub-terms are mutually exclusive per rule.
        if !rule.interactions.is_empty() && !rule.subterms.is_empty() {
            return Err(RulesError::InteractionsAndSubTerms {
                terms: rule.search_terms.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_doc() -> &'static str {
        r#"{
            "rules": [
                {
                    "terms": ["signup"],
                    "interaction_start": "q1",
                    "interactions": [
                        {
                            "interaction_id": "q1",
                            "stop_word": "stop",
                            "type": "text",
                            "question": "Name?",
                            "next_interaction": "end"
                        }
                    ]
                }
            ],
            "default": "Sorry, I didn't catch that"
        }"#
    }

    #[test]
    fn parses_a_valid_document() {
        let catalog = parse(minimal_doc()).unwrap();
        assert_eq!(catalog.rules.len(), 1);
        assert_eq!(catalog.default_response, "Sorry, I didn't catch that");
        assert!(catalog.interaction("q1").is_some());
        assert!(catalog.rule_for_interaction("q1").is_some());
    }

    #[test]
    fn rejects_duplicate_interaction_ids() {
        let doc = r#"{
            "rules": [
                {
                    "terms": ["a"],
                    "interaction_start": "q1",
                    "interactions": [
                        {"interaction_id": "q1", "stop_word": "stop", "type": "text", "question": "A?", "next_interaction": "end"}
                    ]
                },
                {
                    "terms": ["b"],
                    "interaction_start": "q1",
                    "interactions": [
                        {"interaction_id": "q1", "stop_word": "stop", "type": "text", "question": "B?", "next_interaction": "end"}
                    ]
                }
            ],
            "default": "dunno"
        }"#;
        let err = parse(doc).unwrap_err();
        assert!(matches!(
            err,
            RulesError::DuplicateInteractionId(id) if id == "q1"
        ));
    }

    #[test]
    fn rejects_missing_interaction_start() {
        let doc = r#"{
            "rules": [
                {
                    "terms": ["a"],
                    "interaction_start": "nope",
                    "interactions": [
                        {"interaction_id": "q1", "stop_word": "stop", "type": "text", "question": "A?", "next_interaction": "end"}
                    ]
                }
            ],
            "default": "dunno"
        }"#;
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, RulesError::UnknownInteractionStart { .. }));
    }

    #[test]
    fn rejects_absent_interaction_start_field() {
        let doc = r#"{
            "rules": [
                {
                    "terms": ["a"],
                    "interactions": [
                        {"interaction_id": "q1", "stop_word": "stop", "type": "text", "question": "A?", "next_interaction": "end"}
                    ]
                }
            ],
            "default": "dunno"
        }"#;
        assert!(parse(doc).is_err());
    }

    #[test]
    fn rejects_callback_id_mismatch() {
        let doc = r#"{
            "rules": [
                {
                    "terms": ["a"],
                    "interaction_start": "q1",
                    "interactions": [
                        {
                            "interaction_id": "q1",
                            "stop_word": "stop",
                            "type": "attachment",
                            "question": "Pick one",
                            "next_interaction": "end",
                            "attachment": {"callback_id": "other", "text": "Pick", "fallback": "Pick"}
                        }
                    ]
                }
            ],
            "default": "dunno"
        }"#;
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, RulesError::CallbackIdMismatch { .. }));
    }

    #[test]
    fn rejects_interactions_and_subterms_together() {
        let doc = r#"{
            "rules": [
                {
                    "terms": ["a"],
                    "interaction_start": "q1",
                    "interactions": [
                        {"interaction_id": "q1", "stop_word": "stop", "type": "text", "question": "A?", "next_interaction": "end"}
                    ],
                    "subterms": [
                        {"terms": ["x"], "response": "about x"}
                    ]
                }
            ],
            "default": "dunno"
        }"#;
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, RulesError::InteractionsAndSubTerms { .. }));
    }

    #[test]
    fn lowercases_search_terms_at_load() {
        let doc = r#"{
            "rules": [
                {"terms": ["HELP Me"], "response": "sure"}
            ],
            "default": "dunno"
        }"#;
        let catalog = parse(doc).unwrap();
        assert_eq!(catalog.rules[0].search_terms[0], "help me");
        assert!(catalog.rule_for_term("help me").is_some());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse("{nope"), Err(RulesError::Decode(_))));
    }
}
