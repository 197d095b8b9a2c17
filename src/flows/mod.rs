//! Typed prompt flows on top of a raw [`Provider`].
//!
//! Each flow renders a prompt, sends it, and decodes the model's text into the
//! wire contract. Anything that does not decode into the expected shape is a
//! [`ProviderError::Malformed`], never a half-filled response.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::ProviderError;
use crate::log::ExchangeRecorder;
use crate::prompt;
use crate::provider::Provider;
use crate::wire::{
    InsightRequest, InsightResponse, SuggestionsRequest, SuggestionsResponse, SummaryRequest,
    SummaryResponse,
};

#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn get_insights(&self, req: &InsightRequest) -> Result<InsightResponse, ProviderError>;
    async fn get_suggestions(&self, req: &SuggestionsRequest) -> Result<SuggestionsResponse, ProviderError>;
    async fn summarize(&self, req: &SummaryRequest) -> Result<SummaryResponse, ProviderError>;
}

pub struct PromptFlows<P> {
    provider: P,
    recorder: Option<ExchangeRecorder>,
}

impl<P: Provider> PromptFlows<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, recorder: None }
    }

    pub fn with_recorder(mut self, recorder: ExchangeRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    async fn run<R: serde::Serialize + Sync>(
        &self,
        stage: &str,
        req: &R,
        ins: crate::wire::Instruction,
    ) -> Result<String, ProviderError> {
        debug!(stage, provider = self.provider.name(), "flow start");
        let result = self.provider.send(&ins).await;
        if let Some(rec) = &self.recorder {
            let body = match &result {
                Ok(text) => text.clone(),
                Err(e) => format!("error: {e}"),
            };
            rec.record(stage, req, &body);
        }
        if let Err(e) = &result {
            warn!(stage, error = %e, "provider call failed");
        }
        result
    }
}

#[async_trait]
impl<P: Provider> InsightProvider for PromptFlows<P> {
    async fn get_insights(&self, req: &InsightRequest) -> Result<InsightResponse, ProviderError> {
        let raw = self.run("insights", req, prompt::insights_instruction(req)).await?;
        decode_insights(&raw, req.user_query.is_some())
    }

    async fn get_suggestions(&self, req: &SuggestionsRequest) -> Result<SuggestionsResponse, ProviderError> {
        let raw = self.run("suggestions", req, prompt::suggestions_instruction(req)).await?;
        decode_suggestions(&raw)
    }

    async fn summarize(&self, req: &SummaryRequest) -> Result<SummaryResponse, ProviderError> {
        let raw = self.run("summary", req, prompt::summary_instruction(req)).await?;
        decode_summary(&raw)
    }
}

/// Strict parse first; failing that, parse the first `{...}` object embedded in the text.
pub fn parse_json_object<T: DeserializeOwned>(raw: &str) -> Result<T, ProviderError> {
    let strict_err = match serde_json::from_str::<T>(raw.trim()) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    if let Some(obj) = extract_first_json_object(raw) {
        if let Ok(v) = serde_json::from_str::<T>(obj) {
            return Ok(v);
        }
    }
    Err(ProviderError::Malformed(format!("model did not return the expected JSON: {strict_err}")))
}

/// Extracts the first top-level JSON object substring from a string.
/// Braces inside string literals are skipped.
fn extract_first_json_object(s: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|st| &s[st..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn non_empty(field: &str, v: String) -> Result<String, ProviderError> {
    let t = v.trim();
    if t.is_empty() {
        Err(ProviderError::Malformed(format!("{field} is empty")))
    } else {
        Ok(t.to_string())
    }
}

/// `directAnswer` is dropped when no question was asked, whatever the model sent.
pub fn decode_insights(raw: &str, had_query: bool) -> Result<InsightResponse, ProviderError> {
    let r: InsightResponse = parse_json_object(raw)?;
    let direct_answer = if had_query {
        r.direct_answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
    } else {
        None
    };
    Ok(InsightResponse {
        personality_insights: non_empty("personalityInsights", r.personality_insights)?,
        life_path_insights: non_empty("lifePathInsights", r.life_path_insights)?,
        current_transit_insights: non_empty("currentTransitInsights", r.current_transit_insights)?,
        direct_answer,
    })
}

pub fn decode_suggestions(raw: &str) -> Result<SuggestionsResponse, ProviderError> {
    let r: SuggestionsResponse = parse_json_object(raw)?;
    Ok(SuggestionsResponse {
        suggestions: r
            .suggestions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    })
}

pub fn decode_summary(raw: &str) -> Result<SummaryResponse, ProviderError> {
    let r: SummaryResponse = parse_json_object(raw)?;
    Ok(SummaryResponse { summary: non_empty("summary", r.summary)? })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Instruction;
    use parking_lot::Mutex;

    struct Scripted {
        reply: Result<String, String>,
        seen: Mutex<Vec<Instruction>>,
    }

    impl Scripted {
        fn ok(reply: &str) -> Self {
            Self { reply: Ok(reply.to_string()), seen: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { reply: Err("connection refused".into()), seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn send(&self, ins: &Instruction) -> Result<String, ProviderError> {
            self.seen.lock().push(ins.clone());
            self.reply.clone().map_err(ProviderError::Config)
        }
    }

    const FULL: &str = r#"{"personalityInsights":"You are curious.","lifePathInsights":"Keep learning.",
        "currentTransitInsights":"A calm week.","directAnswer":"Yes, travel suits you."}"#;

    #[test]
    fn decodes_fenced_output() {
        let raw = format!("Sure! Here you go:\n```json\n{FULL}\n```");
        let r = decode_insights(&raw, true).unwrap();
        assert_eq!(r.personality_insights, "You are curious.");
        assert_eq!(r.direct_answer.as_deref(), Some("Yes, travel suits you."));
    }

    #[test]
    fn answer_dropped_without_question() {
        let r = decode_insights(FULL, false).unwrap();
        assert!(r.direct_answer.is_none());
    }

    #[test]
    fn missing_or_blank_field_is_malformed() {
        let missing = r#"{"personalityInsights":"a","lifePathInsights":"b"}"#;
        assert!(matches!(decode_insights(missing, false), Err(ProviderError::Malformed(_))));
        let blank = r#"{"personalityInsights":"a","lifePathInsights":" ","currentTransitInsights":"c"}"#;
        assert!(matches!(decode_insights(blank, false), Err(ProviderError::Malformed(_))));
        assert!(matches!(decode_insights("no json here", false), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn extraction_skips_braces_in_strings() {
        let raw = r#"note: {"summary":"a } inside"} trailing"#;
        assert_eq!(decode_summary(raw).unwrap().summary, "a } inside");
    }

    #[test]
    fn suggestions_are_trimmed_and_blank_ones_dropped() {
        let r = decode_suggestions(r#"{"suggestions":[" What's my sign? ","", "Will I travel?"]}"#).unwrap();
        assert_eq!(r.suggestions, ["What's my sign?", "Will I travel?"]);
    }

    #[tokio::test]
    async fn insights_flow_sends_prompt_and_decodes() {
        let flows = PromptFlows::new(Scripted::ok(FULL));
        let req: InsightRequest = serde_json::from_str(
            r#"{"birthDate":"1990-05-15","birthTime":"14:30","birthLocation":"London, UK",
                "currentDate":"2026-10-19","currentTime":"10:00","currentLocation":"London, UK",
                "userQuery":"Will I travel?"}"#,
        )
        .unwrap();
        let r = flows.get_insights(&req).await.unwrap();
        assert_eq!(r.sections()[0].label, "Answer");

        let seen = flows.provider.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].user.contains("Will I travel?"));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let flows = PromptFlows::new(Scripted::failing());
        let err = flows.get_suggestions(&SuggestionsRequest::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[tokio::test]
    async fn recorder_captures_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let flows = PromptFlows::new(Scripted::ok(r#"{"summary":"Short."}"#))
            .with_recorder(ExchangeRecorder::new(dir.path()));
        let r = flows
            .summarize(&SummaryRequest { astrological_data: "Sun in Taurus".into() })
            .await
            .unwrap();
        assert_eq!(r.summary, "Short.");
        let tx: Vec<_> = std::fs::read_dir(dir.path().join("tx")).unwrap().collect();
        assert_eq!(tx.len(), 1);
    }
}
