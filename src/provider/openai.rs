use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::errors::ProviderError;
use crate::wire::Instruction;

pub struct OpenAIProvider {
    model: String,
    api_key: String,
    api_base: String,
    client: Client,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

impl OpenAIProvider {
    pub fn new(model: String, api_key: String, api_base: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { model, api_key, api_base, client })
    }
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn send(&self, ins: &Instruction) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));

        let mut messages = vec![json!({ "role": "system", "content": ins.system })];
        if let Some(dev) = &ins.developer {
            messages.push(json!({ "role": "developer", "content": dev }));
        }
        messages.push(json!({ "role": "user", "content": ins.user }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
            // Force a valid JSON object in the response.
            "response_format": { "type": "json_object" }
        });

        debug!(%url, model = %self.model, "openai request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(%status, body = %text, "openai raw response");

        decode_envelope(status.as_u16(), &text)
    }
}

/// Chat-completions body to the first choice's text.
fn decode_envelope(status: u16, body: &str) -> Result<String, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::Status { status, body: body.to_string() });
    }

    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("openai envelope: {e}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ProviderError::Malformed("openai: empty completion".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_content_is_returned() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"summary\":\"ok\"}"}}]}"#;
        assert_eq!(decode_envelope(200, body).unwrap(), r#"{"summary":"ok"}"#);
    }

    #[test]
    fn error_status_keeps_body() {
        match decode_envelope(503, "upstream unavailable") {
            Err(ProviderError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn no_choices_or_blank_content_is_malformed() {
        assert!(matches!(decode_envelope(200, r#"{"choices":[]}"#), Err(ProviderError::Malformed(_))));
        let blank = r#"{"choices":[{"message":{"content":"  "}}]}"#;
        assert!(matches!(decode_envelope(200, blank), Err(ProviderError::Malformed(_))));
        let null = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(matches!(decode_envelope(200, null), Err(ProviderError::Malformed(_))));
        assert!(matches!(decode_envelope(200, "<html>"), Err(ProviderError::Malformed(_))));
    }
}
