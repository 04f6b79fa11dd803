//! Two-phase template rendering.
//!
//! Phase 1 resolves random-choice alternation markers (`[[a||b||c]]`),
//! phase 2 substitutes the two user fields (`{{ Username }}`,
//! `{{ UserID }}`). Keeping the phases separate means template authors can
//! combine both without the template engine knowing about randomness, and a
//! typo'd field name can't break the (safe) random-choice phase.

use corvid_core::error::TemplateError;
use corvid_core::event::SenderRef;
use minijinja::{context, Environment, UndefinedBehavior};
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::warn;

/// Matches an alternation marker: `[[word||word||word]]`.
const MARKER_PATTERN: &str = r"\[\[[\w|]+\]\]";

/// Pure text renderer. One instance is built at startup and shared
/// read-only by both routers.
pub struct TemplateRenderer {
    marker: Regex,
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // A reference to anything other than Username/UserID is a template
        // error, surfaced to the caller but never fatal to the process.
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self {
            marker: Regex::new(MARKER_PATTERN).expect("marker pattern is valid"),
            env,
        }
    }

    /// Phase 1: resolve every `[[a||b||c]]` marker to one alternative,
    /// picked uniformly at random. Markers with a single alternative (no
    /// `||`) are left as literal text.
    ///
    /// Occurrences are processed right-to-left so earlier match offsets
    /// stay valid while the string is spliced.
    pub fn resolve_variants(&self, template: &str) -> String {
        let mut result = template.to_string();
        let matches: Vec<(usize, usize)> = self
            .marker
            .find_iter(template)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut rng = rand::thread_rng();
        for &(start, end) in matches.iter().rev() {
            let inner = &template[start + 2..end - 2];
            let alternatives: Vec<&str> = inner.split("||").collect();
            if alternatives.len() > 1 {
                if let Some(choice) = alternatives.choose(&mut rng) {
                    result.replace_range(start..end, choice);
                }
            }
        }
        result
    }

    /// Phase 2: substitute the two user fields. Any other reference errors.
    pub fn fill_fields(&self, template: &str, sender: &SenderRef) -> Result<String, TemplateError> {
        self.env
            .render_str(
                template,
                context! {
                    Username => sender.username,
                    UserID => sender.user_id,
                },
            )
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    /// The full pipeline: variants, then fields.
    pub fn render(&self, template: &str, sender: &SenderRef) -> Result<String, TemplateError> {
        let resolved = self.resolve_variants(template);
        self.fill_fields(&resolved, sender)
    }

    /// Render, falling back to the variant-resolved text on a field
    /// substitution error. The reply is never dropped over a typo'd field.
    pub fn render_or_raw(&self, template: &str, sender: &SenderRef) -> String {
        let resolved = self.resolve_variants(template);
        match self.fill_fields(&resolved, sender) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(error = %e, "Template render failed, sending unrendered text");
                resolved
            }
        }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
