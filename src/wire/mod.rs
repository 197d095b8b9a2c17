use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::CurrentContext;
use crate::profile::{BirthProfile, ClockTime, Language};

/// ========================================
/// Request/Response contract with the provider
/// ========================================

/// Prompt text handed to a provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub birth_date: NaiveDate,
    pub birth_time: ClockTime,
    pub birth_location: String,
    pub current_date: NaiveDate,
    pub current_time: ClockTime,
    pub current_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_query: Option<String>,
    #[serde(default)]
    pub language: Language,
}

impl InsightRequest {
    /// A blank query is treated as no query.
    pub fn new(profile: &BirthProfile, now: &CurrentContext, user_query: Option<&str>) -> Self {
        let user_query = user_query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        Self {
            birth_date: profile.date,
            birth_time: profile.time,
            birth_location: profile.location.clone(),
            current_date: now.date,
            current_time: now.time,
            current_location: now.location.clone(),
            user_query,
            language: profile.language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResponse {
    pub personality_insights: String,
    pub life_path_insights: String,
    pub current_transit_insights: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_answer: Option<String>,
}

/// One labelled block of a rendered insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightSection<'a> {
    pub label: &'static str,
    pub text: &'a str,
}

impl InsightResponse {
    /// Answer first (when there is one), then Personality, Life Path, Current Influences.
    pub fn sections(&self) -> Vec<InsightSection<'_>> {
        let mut out = Vec::with_capacity(4);
        if let Some(answer) = self.direct_answer.as_deref() {
            out.push(InsightSection { label: "Answer", text: answer });
        }
        out.push(InsightSection { label: "Personality", text: &self.personality_insights });
        out.push(InsightSection { label: "Life Path", text: &self.life_path_insights });
        out.push(InsightSection { label: "Current Influences", text: &self.current_transit_insights });
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub astrological_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> (BirthProfile, CurrentContext) {
        let profile = BirthProfile::new(
            NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            ClockTime::parse("14:30").unwrap(),
            "London, UK",
            Language::Telugu,
        );
        let now = CurrentContext {
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            time: ClockTime::parse("09:15").unwrap(),
            location: "London, UK".into(),
        };
        (profile, now)
    }

    #[test]
    fn request_serializes_camel_case_fields() {
        let (p, now) = ctx();
        let req = InsightRequest::new(&p, &now, Some("What's my life path?"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["birthDate"], "1990-05-15");
        assert_eq!(json["birthTime"], "14:30");
        assert_eq!(json["birthLocation"], "London, UK");
        assert_eq!(json["currentDate"], "2026-10-19");
        assert_eq!(json["currentTime"], "09:15");
        assert_eq!(json["currentLocation"], "London, UK");
        assert_eq!(json["userQuery"], "What's my life path?");
        assert_eq!(json["language"], "Telugu");
    }

    #[test]
    fn blank_query_is_omitted() {
        let (p, now) = ctx();
        let req = InsightRequest::new(&p, &now, Some("   "));
        assert!(req.user_query.is_none());
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("userQuery").is_none());
    }

    #[test]
    fn language_defaults_to_english_when_absent() {
        let raw = r#"{"birthDate":"1990-05-15","birthTime":"14:30","birthLocation":"X",
            "currentDate":"2026-10-19","currentTime":"09:15","currentLocation":"X"}"#;
        let req: InsightRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.language, Language::English);
    }

    #[test]
    fn sections_put_answer_first() {
        let resp = InsightResponse {
            personality_insights: "p".into(),
            life_path_insights: "l".into(),
            current_transit_insights: "c".into(),
            direct_answer: Some("a".into()),
        };
        let labels: Vec<_> = resp.sections().iter().map(|s| s.label).collect();
        assert_eq!(labels, ["Answer", "Personality", "Life Path", "Current Influences"]);

        let without = InsightResponse { direct_answer: None, ..resp };
        assert_eq!(without.sections().len(), 3);
        assert_eq!(without.sections()[0].label, "Personality");
    }
}
