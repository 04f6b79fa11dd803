//! Interactive callback payload parsing.
//!
//! Button and menu callbacks arrive as a form-encoded POST with a single
//! `payload` field containing JSON. Only the fields the dialog engine
//! needs are deserialized; everything else in the payload is ignored.

use corvid_core::error::TransportError;
use corvid_core::event::{ConversationKey, SelectionEvent};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CallbackForm {
    pub payload: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionCallback {
    pub callback_id: String,
    pub team: IdRef,
    pub channel: IdRef,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

#[derive(Debug, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

impl InteractionCallback {
    /// The value the user picked. Menus report it under `selected_options`,
    /// buttons carry it directly in `value`.
    pub fn selected_value(&self) -> Option<&str> {
        let action = self.actions.first()?;
        if action.kind == "select" {
            action.selected_options.first().map(|o| o.value.as_str())
        } else {
            action.value.as_deref()
        }
    }

    pub fn into_event(self) -> Option<SelectionEvent> {
        let value = self.selected_value()?.to_string();
        Some(SelectionEvent {
            key: ConversationKey::new(self.team.id, self.channel.id),
            callback_id: self.callback_id,
            value,
        })
    }
}

/// Parse the raw form body into a selection event.
pub fn parse_event(body: &[u8]) -> Result<SelectionEvent, TransportError> {
    let form: CallbackForm = serde_urlencoded::from_bytes(body)
        .map_err(|e| TransportError::InvalidPayload(format!("not a callback form: {e}")))?;
    let callback: InteractionCallback = serde_json::from_str(&form.payload)
        .map_err(|e| TransportError::InvalidPayload(format!("bad callback payload: {e}")))?;
    callback.into_event().ok_or_else(|| {
        TransportError::InvalidPayload("callback carries no action value".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_body(payload: &str) -> Vec<u8> {
        serde_urlencoded::to_string([("payload", payload)])
            .unwrap()
            .into_bytes()
    }

    #[test]
    fn button_callback() {
        let payload = r#"{
            "callback_id": "q1",
            "team": {"id": "T1"},
            "channel": {"id": "D1"},
            "actions": [{"type": "button", "value": "yes"}]
        }"#;
        let event = parse_event(&form_body(payload)).unwrap();
        assert_eq!(event.key.storage_key(), "T1:D1");
        assert_eq!(event.callback_id, "q1");
        assert_eq!(event.value, "yes");
    }

    #[test]
    fn menu_callback_uses_selected_options() {
        let payload = r#"{
            "callback_id": "q2",
            "team": {"id": "T1"},
            "channel": {"id": "D1"},
            "actions": [{"type": "select", "selected_options": [{"value": "large"}]}]
        }"#;
        let event = parse_event(&form_body(payload)).unwrap();
        assert_eq!(event.value, "large");
    }

    #[test]
    fn missing_actions_rejected() {
        let payload = r#"{
            "callback_id": "q1",
            "team": {"id": "T1"},
            "channel": {"id": "D1"},
            "actions": []
        }"#;
        assert!(parse_event(&form_body(payload)).is_err());
    }

    #[test]
    fn non_form_body_rejected() {
        assert!(parse_event(b"{\"not\": \"a form\"}").is_err());
    }
}
