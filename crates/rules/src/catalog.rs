//! The rule document model.
//!
//! Field names follow the on-disk JSON format exactly. Attachments are
//! opaque rich-content payloads; the engine passes them through to the
//! platform unmodified, and validation only reads their `callback_id`.

use serde::{Deserialize, Serialize};

/// The parent document: an ordered sequence of rules plus the catalog-level
/// response strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCatalog {
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Rendered and sent when no rule matches a fresh message.
    #[serde(rename = "default")]
    pub default_response: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_cancelled_response: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_complete_response: Option<String>,
}

/// A rule maps search terms (words a user may say to the bot) to a simple
/// response, or to the start of a multi-step interaction, or to a set of
/// single-shot sub-term dialogs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "terms")]
    pub search_terms: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<Interaction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_start: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interaction_end_mods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subterms: Vec<SubTerm>,
}

/// A single-shot disambiguation mapping inside a rule: no structured result
/// is stored, the match only routes to a canned reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTerm {
    #[serde(rename = "terms")]
    pub search_terms: Vec<String>,

    pub response: String,
}

/// What kind of prompt an interaction presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Ask a question, store the next message as the answer.
    Text,
    /// Present a rich-content prompt (button, menu) answered via webhook.
    Attachment,
    /// Emit the question and finalize immediately — no answer expected.
    FinalText,
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InteractionKind::Text => "text",
            InteractionKind::Attachment => "attachment",
            InteractionKind::FinalText => "final_text",
        };
        write!(f, "{s}")
    }
}

/// One step of a guided multi-step dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub interaction_id: String,

    /// Word that cancels the whole interaction when sent verbatim.
    pub stop_word: String,

    #[serde(rename = "type")]
    pub kind: InteractionKind,

    #[serde(default)]
    pub question: String,

    /// The successor step, or `"end"`.
    pub next_interaction: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<serde_json::Value>,

    /// Branch table consulted only on the webhook path, where the answer is
    /// a selection from a closed option set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_interaction_dynamic: Vec<DynamicNext>,
}

/// One entry of an interaction's dynamic branch table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicNext {
    /// The selected value that triggers this branch.
    pub response: String,
    pub next_interaction: String,
}

impl Rule {
    /// Look for a particular interaction within this rule.
    pub fn interaction(&self, id: &str) -> Option<&Interaction> {
        self.interactions.iter().find(|i| i.interaction_id == id)
    }

    /// The interaction-id → question map handed to end-of-interaction
    /// modules.
    pub fn question_map(&self) -> std::collections::HashMap<String, String> {
        self.interactions
            .iter()
            .map(|i| (i.interaction_id.clone(), i.question.clone()))
            .collect()
    }
}

impl RuleCatalog {
    /// Look for a particular interaction across all rules.
    pub fn interaction(&self, id: &str) -> Option<&Interaction> {
        self.rules.iter().find_map(|r| r.interaction(id))
    }

    /// The rule which contains this particular interaction.
    pub fn rule_for_interaction(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.interaction(id).is_some())
    }

    /// The rule owning a search term (exact term, already lowercased at
    /// load). Used to resume a sub-term dialog.
    pub fn rule_for_term(&self, term: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|r| r.search_terms.iter().any(|t| t == term))
    }
}
