use crate::wire::{InsightRequest, Instruction, SuggestionsRequest, SummaryRequest};

fn tone_rules() -> &'static str {
r#"Audience & Tone:
- The reader is COMPLETELY NEW to astrology. Be simple, clear and encouraging.
- No jargon: avoid aspects, houses and planet names unless one is essential, and then explain it in plain words.
- Each insight is 1-2 short sentences a beginner understands on first read.
- Address the reader directly as "you"."#
}

fn perspective_rules() -> &'static str {
r#"Perspective:
- In the user's question, "you", "your", "I" and "me" all refer to the PERSON whose birth details are given, never to you, the assistant.
- Frame every answer as a reading of THEIR chart.
- Never ask for birth details; they are provided below."#
}

fn insights_schema(with_answer: bool) -> String {
    let answer = if with_answer {
        ",\n  \"directAnswer\": string"
    } else {
        ""
    };
    format!(
r#"Return EXACTLY ONE JSON object (no markdown, no prose, no code fences):
{{
  "personalityInsights": string,
  "lifePathInsights": string,
  "currentTransitInsights": string{answer}
}}"#
    )
}

pub fn system_prompt_insights(language: &str) -> String {
    format!(
r#"You are an AI astrologer explaining insights to a beginner.

{tone}

{perspective}

Write every field in {language}."#,
        tone = tone_rules(),
        perspective = perspective_rules(),
    )
}

pub fn user_prompt_insights(req: &InsightRequest) -> String {
    let language = req.language.as_str();
    let mut s = format!(
r#"User's Birth Details:
Birth Date: {birth_date}
Birth Time: {birth_time}
Birth Location: {birth_location}

Current Context:
Current Date: {current_date}
Current Time: {current_time}
Current Location: {current_location}
"#,
        birth_date = req.birth_date.format("%Y-%m-%d"),
        birth_time = req.birth_time,
        birth_location = req.birth_location,
        current_date = req.current_date.format("%Y-%m-%d"),
        current_time = req.current_time,
        current_location = req.current_location,
    );

    if let Some(q) = &req.user_query {
        s.push_str(&format!("\nUser's Question: {q}\n"));
    }

    s.push_str(&format!(
r#"
Using ONLY these details, write in {language}:
1. Personality: one key trait, in simple terms (e.g. "You likely have a very creative side.").
2. Life Path: simple guidance about their general direction (e.g. "Learning new things could be really rewarding for you.").
3. Current Influences: a gentle hint about the energy around them right now (e.g. "It might be a good time to focus on your goals.").
"#
    ));

    if let Some(q) = &req.user_query {
        s.push_str(&format!(
            "4. Direct Answer: answer \"{q}\" about the USER in extremely simple terms, concise and clear.\n"
        ));
    }
    s
}

pub fn insights_instruction(req: &InsightRequest) -> Instruction {
    Instruction {
        system: system_prompt_insights(req.language.as_str()),
        user: user_prompt_insights(req),
        developer: Some(insights_schema(req.user_query.is_some())),
    }
}

pub fn suggestions_instruction(req: &SuggestionsRequest) -> Instruction {
    let topic = req.topic.as_deref().unwrap_or("general astrology");
    Instruction {
        system: "You are an astrological prompt suggestion generator.".to_string(),
        user: format!(
            "Generate a short list of questions a user could ask to start a conversation about astrology.\n\nTopic: {topic}"
        ),
        developer: Some(
r#"Return EXACTLY ONE JSON object (no markdown, no prose, no code fences):
{ "suggestions": [string, ...] }
Each suggestion is one short question written from the user's point of view."#
                .to_string(),
        ),
    }
}

pub fn summary_instruction(req: &SummaryRequest) -> Instruction {
    Instruction {
        system: "You are an expert astrologer.".to_string(),
        user: format!(
            "Summarize the following astrological data into a concise, easy-to-understand summary.\n\nAstrological Data: {}",
            req.astrological_data
        ),
        developer: Some(r#"Return EXACTLY ONE JSON object: { "summary": string }"#.to_string()),
    }
}
