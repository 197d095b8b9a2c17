//! Chat session controller.
//!
//! A session is mounted once against a [`ProfileStore`]. Without a complete
//! profile it goes to `NoProfile` and asks for a redirect to onboarding;
//! otherwise it is `Ready` and accepts one question at a time.
//!
//! Each question is split into [`ChatSession::begin_submit`], which appends the
//! user message, sets the busy flag and hands back a [`PendingInsight`], and
//! [`ChatSession::complete`], which applies the provider's result. Results
//! carry the [`RequestToken`] they were issued with; a result whose token no
//! longer matches (the session was closed, or a newer request is current) is
//! dropped.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::current_context;
use crate::errors::{ProviderError, SessionError};
use crate::flows::InsightProvider;
use crate::nav::{Notice, Route};
use crate::profile::BirthProfile;
use crate::store::ProfileStore;
use crate::wire::{InsightRequest, InsightResponse, SuggestionsRequest, SuggestionsResponse};

pub const APOLOGY: &str = "Sorry, I had trouble understanding that. Could you try asking in a different way?";

pub const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Tell me about my personality.",
    "What's my life path?",
    "What's happening now?",
];

/// Only this many suggestions are ever offered.
pub const VISIBLE_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Insight(InsightResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub content: MessageContent,
}

impl ChatMessage {
    fn new(sender: Sender, content: MessageContent) -> Self {
        let prefix = match sender {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        };
        Self { id: format!("{prefix}-{}", Uuid::new_v4()), sender, content }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(t) => Some(t),
            MessageContent::Insight(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    NoProfile,
    Ready(BirthProfile),
    Closed,
}

/// Result of mounting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mount {
    Ready,
    Redirect(Route),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    session: Uuid,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInsight {
    pub token: RequestToken,
    pub request: InsightRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket {
    session: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The result arrived for a torn-down session or superseded request and was dropped.
    Stale,
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    state: SessionState,
    transcript: Vec<ChatMessage>,
    in_flight: Option<RequestToken>,
    seq: u64,
    suggestions: Vec<String>,
    show_suggestions: bool,
    notices: Vec<Notice>,
    location_override: Option<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Unloaded,
            transcript: Vec::new(),
            in_flight: None,
            seq: 0,
            suggestions: Vec::new(),
            show_suggestions: false,
            notices: Vec::new(),
            location_override: None,
        }
    }

    /// Use this place as the current location instead of the birth location.
    pub fn with_current_location(mut self, location: Option<String>) -> Self {
        self.location_override = location;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn profile(&self) -> Option<&BirthProfile> {
        match &self.state {
            SessionState::Ready(p) => Some(p),
            _ => None,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Suggestions currently on offer; empty once hidden.
    pub fn visible_suggestions(&self) -> &[String] {
        if self.show_suggestions && !self.transcript.is_empty() && !self.is_busy() {
            let n = self.suggestions.len().min(VISIBLE_SUGGESTIONS);
            &self.suggestions[..n]
        } else {
            &[]
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Read the profile slot. Only the first call does anything; later calls
    /// report the state already reached.
    pub fn mount(&mut self, store: &dyn ProfileStore) -> Mount {
        match &self.state {
            SessionState::Unloaded => {}
            SessionState::Ready(_) => return Mount::Ready,
            SessionState::NoProfile | SessionState::Closed => return Mount::Redirect(Route::GetStarted),
        }

        let profile = match store.load() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored birth details unusable");
                None
            }
        };

        match profile {
            Some(p) => {
                info!(session = %self.id, "session ready");
                let welcome = format!(
                    "Welcome back! Using your saved birth details: {}, {}, {}. How can I help you today?",
                    p.date.format("%Y-%m-%d"),
                    p.time,
                    p.location
                );
                self.transcript.push(ChatMessage {
                    id: format!("initial-message-{}", Uuid::new_v4()),
                    sender: Sender::Assistant,
                    content: MessageContent::Text(welcome),
                });
                self.state = SessionState::Ready(p);
                Mount::Ready
            }
            None => {
                info!(session = %self.id, "no birth details; redirecting");
                self.state = SessionState::NoProfile;
                self.notices.push(Notice::destructive(
                    "Birth details required.",
                    "Please enter your details to start.",
                ));
                Mount::Redirect(Route::GetStarted)
            }
        }
    }

    /// `None` unless the session is ready.
    pub fn suggestions_request(&self, topic: Option<String>) -> Option<(SuggestionTicket, SuggestionsRequest)> {
        match self.state {
            SessionState::Ready(_) => Some((SuggestionTicket { session: self.id }, SuggestionsRequest { topic })),
            _ => None,
        }
    }

    /// An empty list leaves suggestions hidden; a failure substitutes the fallback three.
    pub fn apply_suggestions(
        &mut self,
        ticket: SuggestionTicket,
        result: Result<SuggestionsResponse, ProviderError>,
    ) -> Completion {
        if ticket.session != self.id || !matches!(self.state, SessionState::Ready(_)) {
            return Completion::Stale;
        }
        match result {
            Ok(r) if !r.suggestions.is_empty() => {
                self.suggestions = r.suggestions;
                self.show_suggestions = true;
            }
            Ok(_) => debug!("provider returned no suggestions"),
            Err(e) => {
                warn!(error = %e, "suggestions failed; using fallback");
                self.suggestions = FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
                self.show_suggestions = true;
            }
        }
        Completion::Applied
    }

    pub async fn load_suggestions(&mut self, provider: &dyn InsightProvider, topic: Option<String>) -> Completion {
        let Some((ticket, req)) = self.suggestions_request(topic) else {
            return Completion::Stale;
        };
        let result = provider.get_suggestions(&req).await;
        self.apply_suggestions(ticket, result)
    }

    /// Append the user's message and issue a request for it.
    pub fn begin_submit(&mut self, text: &str, now: NaiveDateTime) -> Result<PendingInsight, SessionError> {
        let profile = match &self.state {
            SessionState::Ready(p) => p,
            SessionState::Closed => return Err(SessionError::Closed),
            SessionState::Unloaded | SessionState::NoProfile => {
                self.notices.push(Notice::destructive(
                    "Missing Birth Details",
                    "Cannot process request without birth details. Redirecting...",
                ));
                return Err(SessionError::MissingProfile);
            }
        };
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            self.notices.push(Notice::destructive("Empty Message", "Please enter your question."));
            return Err(SessionError::EmptyMessage);
        }

        let ctx = current_context(profile, self.location_override.as_deref(), now);
        let request = InsightRequest::new(profile, &ctx, Some(text));

        self.transcript.push(ChatMessage::new(Sender::User, MessageContent::Text(text.to_string())));
        self.show_suggestions = false;
        self.seq += 1;
        let token = RequestToken { session: self.id, seq: self.seq };
        self.in_flight = Some(token);
        debug!(session = %self.id, seq = self.seq, "insight request issued");
        Ok(PendingInsight { token, request })
    }

    /// Apply a provider result. Failures become the fixed apology plus an error notice.
    pub fn complete(&mut self, token: RequestToken, result: Result<InsightResponse, ProviderError>) -> Completion {
        if self.in_flight != Some(token) || token.session != self.id {
            debug!(seq = token.seq, "dropping stale insight result");
            return Completion::Stale;
        }
        match result {
            Ok(r) => {
                self.transcript.push(ChatMessage::new(Sender::Assistant, MessageContent::Insight(r)));
            }
            Err(e) => {
                warn!(error = %e, "insight request failed");
                self.transcript.push(ChatMessage::new(Sender::Assistant, MessageContent::Text(APOLOGY.to_string())));
                self.notices.push(Notice::destructive(
                    "AI Error",
                    "Failed to get astrological insights. Please try again.",
                ));
            }
        }
        self.in_flight = None;
        Completion::Applied
    }

    pub async fn submit(
        &mut self,
        provider: &dyn InsightProvider,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<Completion, SessionError> {
        let pending = self.begin_submit(text, now)?;
        let result = provider.get_insights(&pending.request).await;
        Ok(self.complete(pending.token, result))
    }

    /// Send the suggestion at `index` (0-based, among the visible ones) as the user's message.
    pub async fn accept_suggestion(
        &mut self,
        provider: &dyn InsightProvider,
        index: usize,
        now: NaiveDateTime,
    ) -> Result<Completion, SessionError> {
        let text = self
            .visible_suggestions()
            .get(index)
            .cloned()
            .ok_or(SessionError::NoSuchSuggestion(index))?;
        self.submit(provider, &text, now).await
    }

    /// Tear the session down. Results still in flight will be dropped.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            info!(session = %self.id, messages = self.transcript.len(), "session closed");
        }
        self.state = SessionState::Closed;
        self.in_flight = None;
        self.show_suggestions = false;
    }
}
