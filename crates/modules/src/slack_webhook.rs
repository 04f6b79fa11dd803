//! Slack incoming-webhook module.
//!
//! Posts the completed dialog's answers to a Slack incoming webhook as one
//! message with a field per answered question.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use corvid_core::error::ModuleError;
use corvid_core::module::Module;
use corvid_core::session::{SessionFields, FIELD_USER_ID, RESPONSE_PREFIX};

const SUMMARY_TEXT: &str = "corvid received a complete response from someone";

pub struct SlackWebhookModule {
    client: reqwest::Client,
}

impl SlackWebhookModule {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Build the webhook body: one attachment field per answered question.
    fn body(payload: &SessionFields, questions: &HashMap<String, String>) -> serde_json::Value {
        let mut fields = Vec::new();
        for (field, answer) in payload {
            let Some(id) = field.strip_prefix(RESPONSE_PREFIX) else {
                continue;
            };
            if let Some(question) = questions.get(id) {
                fields.push(json!({
                    "title": question,
                    "value": answer,
                    "short": false,
                }));
            }
        }

        let text = payload
            .get(FIELD_USER_ID)
            .map(|id| format!("Response from <@{id}>"))
            .unwrap_or_default();

        json!({
            "text": SUMMARY_TEXT,
            "attachments": [{
                "fallback": SUMMARY_TEXT,
                "text": text,
                "color": "#36a64f",
                "footer": "corvid",
                "ts": chrono::Utc::now().timestamp(),
                "fields": fields,
            }],
        })
    }
}

impl Default for SlackWebhookModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for SlackWebhookModule {
    fn name(&self) -> &str {
        "SlackWebhookModule"
    }

    fn env_vars(&self) -> &[&str] {
        &["URL"]
    }

    async fn run(
        &self,
        payload: &SessionFields,
        env: &HashMap<String, String>,
        questions: &HashMap<String, String>,
    ) -> Result<(), ModuleError> {
        let url = env
            .get("SLACKWEBHOOKMODULE_URL")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ModuleError::Misconfigured {
                module: self.name().to_string(),
                reason: "SLACKWEBHOOKMODULE_URL is not set".to_string(),
            })?;

        let body = Self::body(payload, questions);
        self.client
            .post(url)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ModuleError::RunFailed {
                module: self.name().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_pairs_answers_with_questions() {
        let mut payload = SessionFields::new();
        payload.insert("userid".into(), "U123".into());
        payload.insert("response:q1".into(), "Alice".into());
        payload.insert("response:q2".into(), "alice@example.com".into());
        payload.insert("stop_word".into(), "stop".into());

        let mut questions = HashMap::new();
        questions.insert("q1".to_string(), "Name?".to_string());
        questions.insert("q2".to_string(), "Email?".to_string());

        let body = SlackWebhookModule::body(&payload, &questions);
        let attachment = &body["attachments"][0];
        assert_eq!(attachment["text"], "Response from <@U123>");
        let fields = attachment["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().any(|f| f["title"] == "Name?" && f["value"] == "Alice"));
    }

    #[tokio::test]
    async fn missing_url_is_misconfigured() {
        let module = SlackWebhookModule::new();
        let err = module
            .run(&SessionFields::new(), &HashMap::new(), &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleError::Misconfigured { .. }));
    }
}
