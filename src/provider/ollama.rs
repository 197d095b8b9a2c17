use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{system_text, Provider};
use crate::errors::ProviderError;
use crate::wire::Instruction;

pub struct Ollama {
    pub model: String,
    pub url: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

impl Ollama {
    pub fn new(model: String, url: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { model, url, client })
    }
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn send(&self, ins: &Instruction) -> Result<String, ProviderError> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let system = system_text(ins);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Msg { role: "system", content: &system },
                Msg { role: "user", content: &ins.user },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions { temperature: 0.7 },
        };

        debug!(%url, model = %self.model, "ollama request");

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(%status, body = %text, "ollama raw response");

        decode_envelope(status.as_u16(), text)
    }
}

/// Chat envelope to message content. Some builds answer with the bare model
/// output instead, which is passed through as is.
fn decode_envelope(status: u16, body: String) -> Result<String, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::Status { status, body });
    }
    match serde_json::from_str::<ChatResponse>(&body) {
        Ok(c) => Ok(c.message.content),
        Err(_) => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_envelope_is_unwrapped() {
        let body = r#"{"model":"llama3.2","message":{"role":"assistant","content":"{\"summary\":\"ok\"}"},"done":true}"#;
        assert_eq!(decode_envelope(200, body.into()).unwrap(), r#"{"summary":"ok"}"#);
    }

    #[test]
    fn bare_output_passes_through() {
        let body = r#"{"summary":"ok"}"#;
        assert_eq!(decode_envelope(200, body.into()).unwrap(), body);
    }

    #[test]
    fn missing_model_is_a_status_error() {
        let body = r#"{"error":"model 'llama3.2' not found"}"#;
        match decode_envelope(404, body.into()) {
            Err(ProviderError::Status { status, body: b }) => {
                assert_eq!(status, 404);
                assert!(b.contains("not found"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
