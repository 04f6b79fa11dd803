//! The interaction state machine.
//!
//! Given a session snapshot and an inbound event, [`DialogEngine`] decides
//! the next state and the output to emit. It performs no I/O: session
//! writes, message sends, and module invocation are described in the
//! returned [`Outcome`] and executed by the routers.
//!
//! States per conversation key:
//! - no session (empty field map) — initial, and reached again after
//!   completion or cancellation
//! - awaiting an interaction response (`interaction` field set)
//! - awaiting a sub-term response (`searchTerm` field set)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use corvid_core::error::EngineError;
use corvid_core::event::{Reply, SenderRef};
use corvid_core::session::{
    self, SessionFields, FIELD_INTERACTION, FIELD_NEXT_INTERACTION, FIELD_SEARCH_TERM,
    FIELD_STOP_WORD, FIELD_TYPE, FIELD_USERNAME, FIELD_USER_ID, INTERACTION_TTL, NEXT_END,
    SUBTERM_TTL,
};
use corvid_rules::{Interaction, InteractionKind, Rule, RuleCatalog};
use tracing::{debug, info, warn};

use crate::template::TemplateRenderer;

/// Fallback reply when no sub-term matches.
const SUBTERM_FALLBACK: &str = "Sorry, I couldn't help you with that";
/// Fallback reply when an interaction is cancelled via its stop word.
const CANCELLED_FALLBACK: &str = "Interaction cancelled";
/// Fallback reply when the final interaction completes.
const COMPLETE_FALLBACK: &str = "Thanks! We'll get back to you soon";
/// Reply for a webhook callback whose session has expired.
const TIMED_OUT_REPLY: &str = "Looks like this Interaction timed out or no longer exists";

/// A session mutation to be applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOp {
    /// Create a fresh session with a TTL. The TTL is set exactly once here
    /// and never refreshed on later steps.
    Create {
        fields: Vec<(String, String)>,
        ttl: Duration,
    },
    /// Overwrite or add fields on the existing session.
    Set { fields: Vec<(String, String)> },
    /// Remove the session entirely.
    Delete,
}

/// End-of-interaction module invocation, resolved by the caller against its
/// module registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDispatch {
    /// Module names from the owning rule's `interaction_end_mods`.
    pub modules: Vec<String>,
    /// The completed session's full field map, answers included.
    pub payload: SessionFields,
    /// interaction-id → question, for every step of the owning rule.
    pub questions: HashMap<String, String>,
}

/// Everything a state transition produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub replies: Vec<Reply>,
    pub ops: Vec<SessionOp>,
    pub dispatch: Option<ModuleDispatch>,
    /// Webhook path only: whether the reply replaces the original message.
    pub replace_original: bool,
}

impl Outcome {
    fn reply(reply: Reply) -> Self {
        Outcome {
            replies: vec![reply],
            ..Outcome::default()
        }
    }
}

/// The pure decision core. Cheap to share: the catalog is read-only for the
/// process lifetime.
pub struct DialogEngine {
    catalog: Arc<RuleCatalog>,
    renderer: TemplateRenderer,
}

impl DialogEngine {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self {
            catalog,
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Handle an inbound text message from the real-time stream.
    pub fn on_message(
        &self,
        session: &SessionFields,
        sender: &SenderRef,
        text: &str,
    ) -> Result<Outcome, EngineError> {
        if session.is_empty() {
            return self.on_fresh_message(sender, text);
        }
        if let Some(term) = session.get(FIELD_SEARCH_TERM) {
            return self.on_subterm_response(term, sender, text);
        }
        self.on_interaction_response(session, sender, text)
    }

    /// Handle a selection (button/menu value) from the webhook path.
    ///
    /// Identical to a text response except the next step may be overridden
    /// by the interaction's dynamic branch table, and replies replace the
    /// original interactive message.
    pub fn on_selection(
        &self,
        session: &SessionFields,
        callback_id: &str,
        value: &str,
    ) -> Result<Outcome, EngineError> {
        if session.is_empty() {
            // The key expired or never existed; tell the clicker and move on.
            return Ok(Outcome::reply(Reply::text(TIMED_OUT_REPLY)));
        }

        let sender = sender_from_session(session);
        info!(
            user = %sender.username,
            interaction = %callback_id,
            "User responded to an interaction via callback"
        );

        let current = self
            .catalog
            .interaction(callback_id)
            .ok_or_else(|| EngineError::DanglingInteraction(callback_id.to_string()))?;

        // The catalog-declared successor, unless the selection hits an
        // entry in the dynamic branch table.
        let mut next_id = session
            .get(FIELD_NEXT_INTERACTION)
            .cloned()
            .unwrap_or_else(|| NEXT_END.to_string());
        for branch in &current.next_interaction_dynamic {
            if branch.response == value {
                next_id = branch.next_interaction.clone();
            }
        }

        let mut outcome = self.advance(
            session,
            &sender,
            callback_id,
            &next_id,
            value,
            Some(value),
        )?;
        outcome.replace_original = true;
        Ok(outcome)
    }

    // --- no-session path ---

    fn on_fresh_message(&self, sender: &SenderRef, text: &str) -> Result<Outcome, EngineError> {
        let msg = text.to_lowercase();

        for rule in &self.catalog.rules {
            let Some(term) = rule.search_terms.iter().find(|t| msg.contains(t.as_str()))
            else {
                continue;
            };

            let mut outcome = Outcome::default();

            if let Some(response) = &rule.response {
                info!(term = %term, user = %sender.username, "Sending standard response");
                outcome
                    .replies
                    .push(Reply::text(self.renderer.render_or_raw(response, sender)));
            }

            if let Some(attachment) = &rule.attachment {
                info!(term = %term, user = %sender.username, "Sending standard attachment");
                outcome.replies.push(Reply::Attachment {
                    text: None,
                    attachment: attachment.clone(),
                });
            }

            if !rule.interactions.is_empty() {
                let start_id = rule.interaction_start.as_deref().unwrap_or_default();
                let start = rule
                    .interaction(start_id)
                    .ok_or_else(|| EngineError::DanglingInteraction(start_id.to_string()))?;

                info!(term = %term, user = %sender.username, "Initiating interaction");

                if start.kind == InteractionKind::FinalText {
                    // Single-step rule: emit the final text and complete
                    // without ever persisting a session.
                    outcome.replies.push(Reply::text(start.question.clone()));
                    let payload: SessionFields =
                        new_session_fields(sender, start).into_iter().collect();
                    self.finalize(rule, payload, sender, None, &mut outcome);
                } else {
                    outcome.ops.push(SessionOp::Create {
                        fields: new_session_fields(sender, start),
                        ttl: INTERACTION_TTL,
                    });
                    outcome.replies.extend(prompt_replies(start, None));
                }
            } else if !rule.subterms.is_empty() {
                debug!(term = %term, "Starting sub-term dialog");
                outcome.ops.push(SessionOp::Create {
                    fields: vec![(FIELD_SEARCH_TERM.to_string(), term.clone())],
                    ttl: SUBTERM_TTL,
                });
            }

            // First matching rule wins; later rules never evaluated.
            return Ok(outcome);
        }

        info!(user = %sender.username, "Default response sent");
        Ok(Outcome::reply(Reply::text(
            self.renderer
                .render_or_raw(&self.catalog.default_response, sender),
        )))
    }

    // --- sub-term path ---

    fn on_subterm_response(
        &self,
        term: &str,
        sender: &SenderRef,
        text: &str,
    ) -> Result<Outcome, EngineError> {
        let rule = self
            .catalog
            .rule_for_term(term)
            .ok_or_else(|| EngineError::DanglingSearchTerm(term.to_string()))?;

        let msg = text.to_lowercase();
        let mut matched: Option<&str> = None;
        for sub in &rule.subterms {
            for sub_term in &sub.search_terms {
                if msg.contains(sub_term.as_str()) {
                    if matched.is_none() {
                        matched = Some(&sub.response);
                        info!(term = %sub_term, user = %sender.username, "Sub-term matched");
                    } else {
                        // First hit wins; later hits are only logged.
                        debug!(term = %sub_term, "Additional sub-term match ignored");
                    }
                }
            }
        }

        let reply = match matched {
            Some(response) => self.renderer.render_or_raw(response, sender),
            None => SUBTERM_FALLBACK.to_string(),
        };

        // Sub-term dialogs are always exactly one round trip.
        Ok(Outcome {
            replies: vec![Reply::text(reply)],
            ops: vec![SessionOp::Delete],
            ..Outcome::default()
        })
    }

    // --- in-interaction path ---

    fn on_interaction_response(
        &self,
        session: &SessionFields,
        sender: &SenderRef,
        text: &str,
    ) -> Result<Outcome, EngineError> {
        if session.get(FIELD_STOP_WORD).map(String::as_str) == Some(text) {
            let interaction = session
                .get(FIELD_INTERACTION)
                .map(String::as_str)
                .unwrap_or_default();
            info!(user = %sender.username, interaction = %interaction, "User cancelled interaction");

            let reply = match &self.catalog.interaction_cancelled_response {
                Some(custom) => self.renderer.render_or_raw(custom, sender),
                None => CANCELLED_FALLBACK.to_string(),
            };
            return Ok(Outcome {
                replies: vec![Reply::text(reply)],
                ops: vec![SessionOp::Delete],
                ..Outcome::default()
            });
        }

        let current_id = session
            .get(FIELD_INTERACTION)
            .ok_or_else(|| EngineError::DanglingInteraction("<unset>".to_string()))?
            .clone();
        let next_id = session
            .get(FIELD_NEXT_INTERACTION)
            .cloned()
            .unwrap_or_else(|| NEXT_END.to_string());

        info!(user = %sender.username, interaction = %current_id, "User responded to an interaction");

        self.advance(session, sender, &current_id, &next_id, text, None)
    }

    // --- shared transition tail ---

    /// Record the answer for `current_id` and move to `next_id`.
    ///
    /// `selected` is set on the webhook path and prefixes outbound text with
    /// the user's choice.
    fn advance(
        &self,
        session: &SessionFields,
        sender: &SenderRef,
        current_id: &str,
        next_id: &str,
        answer: &str,
        selected: Option<&str>,
    ) -> Result<Outcome, EngineError> {
        let mut outcome = Outcome::default();
        let answer_field = session::response_field(current_id);

        if next_id != NEXT_END {
            let next = self
                .catalog
                .interaction(next_id)
                .ok_or_else(|| EngineError::DanglingInteraction(next_id.to_string()))?;

            if next.kind == InteractionKind::FinalText {
                // Emit the final text, then complete as if `end`.
                outcome
                    .replies
                    .push(prefixed_text(&next.question, selected));
                self.finalize_recorded(session, sender, current_id, answer, selected, &mut outcome)?;
            } else {
                outcome.ops.push(SessionOp::Set {
                    fields: vec![
                        (answer_field, answer.to_string()),
                        (FIELD_INTERACTION.to_string(), next.interaction_id.clone()),
                        (FIELD_TYPE.to_string(), next.kind.to_string()),
                        (
                            FIELD_NEXT_INTERACTION.to_string(),
                            next.next_interaction.clone(),
                        ),
                    ],
                });
                outcome.replies.extend(prompt_replies(next, selected));
            }
        } else {
            self.finalize_recorded(session, sender, current_id, answer, selected, &mut outcome)?;
        }

        Ok(outcome)
    }

    /// Finalize a session whose last answer has just been recorded:
    /// compute the completed payload, delete the session, emit the
    /// completion reply, and name the modules to run.
    fn finalize_recorded(
        &self,
        session: &SessionFields,
        sender: &SenderRef,
        current_id: &str,
        answer: &str,
        selected: Option<&str>,
        outcome: &mut Outcome,
    ) -> Result<(), EngineError> {
        let mut payload = session.clone();
        payload.insert(session::response_field(current_id), answer.to_string());

        info!(
            user = %sender.username,
            interaction = %current_id,
            "User completed all interactions"
        );

        outcome.ops.push(SessionOp::Delete);

        match self.catalog.rule_for_interaction(current_id) {
            Some(rule) => self.finalize(rule, payload, sender, selected, outcome),
            None => {
                // Should be unreachable after load-time validation; the
                // conversation still completes, we just can't run modules.
                warn!(interaction = %current_id, "No rule found for completed interaction");
                outcome
                    .replies
                    .push(prefixed_text(&self.completion_text(sender), selected));
            }
        }
        Ok(())
    }

    fn finalize(
        &self,
        rule: &Rule,
        payload: SessionFields,
        sender: &SenderRef,
        selected: Option<&str>,
        outcome: &mut Outcome,
    ) {
        outcome
            .replies
            .push(prefixed_text(&self.completion_text(sender), selected));

        if !rule.interaction_end_mods.is_empty() {
            outcome.dispatch = Some(ModuleDispatch {
                modules: rule.interaction_end_mods.clone(),
                payload,
                questions: rule.question_map(),
            });
        }
    }

    fn completion_text(&self, sender: &SenderRef) -> String {
        match &self.catalog.interaction_complete_response {
            Some(custom) => self.renderer.render_or_raw(custom, sender),
            None => COMPLETE_FALLBACK.to_string(),
        }
    }
}

/// The field set written when a full interaction session is created.
fn new_session_fields(sender: &SenderRef, start: &Interaction) -> Vec<(String, String)> {
    vec![
        (FIELD_INTERACTION.to_string(), start.interaction_id.clone()),
        (FIELD_STOP_WORD.to_string(), start.stop_word.clone()),
        (FIELD_USER_ID.to_string(), sender.user_id.clone()),
        (FIELD_USERNAME.to_string(), sender.username.clone()),
        (FIELD_TYPE.to_string(), start.kind.to_string()),
        (
            FIELD_NEXT_INTERACTION.to_string(),
            start.next_interaction.clone(),
        ),
    ]
}

/// The prompt replies for presenting an interaction to the user.
fn prompt_replies(interaction: &Interaction, selected: Option<&str>) -> Vec<Reply> {
    match interaction.kind {
        InteractionKind::Text | InteractionKind::FinalText => {
            vec![prefixed_text(&interaction.question, selected)]
        }
        InteractionKind::Attachment => {
            let text = if interaction.question.is_empty() {
                selected.map(|s| format!("You selected: {s}"))
            } else {
                Some(match selected {
                    Some(s) => format!("You selected: {s}\n{}", interaction.question),
                    None => interaction.question.clone(),
                })
            };
            match &interaction.attachment {
                Some(attachment) => vec![Reply::Attachment {
                    text,
                    attachment: attachment.clone(),
                }],
                // No rich content configured; fall back to the bare question.
                None => text.map(Reply::Text).into_iter().collect(),
            }
        }
    }
}

fn prefixed_text(text: &str, selected: Option<&str>) -> Reply {
    match selected {
        Some(s) => Reply::text(format!("You selected: {s}\n{text}")),
        None => Reply::text(text.to_string()),
    }
}

fn sender_from_session(session: &SessionFields) -> SenderRef {
    SenderRef {
        user_id: session.get(FIELD_USER_ID).cloned().unwrap_or_default(),
        username: session.get(FIELD_USERNAME).cloned().unwrap_or_default(),
    }
}
