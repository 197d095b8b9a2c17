use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{system_text, Provider};
use crate::errors::ProviderError;
use crate::wire::Instruction;

pub struct Anthropic {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub api_version: String,
    client: Client,
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
    system: &'a str,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

impl Anthropic {
    pub fn new(
        model: String,
        api_key: String,
        api_base: String,
        api_version: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { model, api_key, api_base, api_version, client })
    }
}

#[async_trait]
impl Provider for Anthropic {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn send(&self, ins: &Instruction) -> Result<String, ProviderError> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let system = system_text(ins);
        let body = MsgRequest {
            model: &self.model,
            max_tokens: 1024,
            messages: vec![Msg { role: "user", content: &ins.user }],
            system: &system,
        };

        debug!(%url, model = %self.model, "anthropic request");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(%status, body = %text, "anthropic raw response");

        decode_envelope(status.as_u16(), &text)
    }
}

/// Messages API body to its first non-empty text block.
fn decode_envelope(status: u16, body: &str) -> Result<String, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(ProviderError::Status { status, body: body.to_string() });
    }

    let parsed: MsgResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("anthropic envelope: {e}")))?;

    parsed
        .content
        .into_iter()
        .find(|b| b.r#type == "text" && !b.text.is_empty())
        .map(|b| b.text)
        .ok_or_else(|| ProviderError::Malformed("anthropic: empty content".into()))
}
