use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use webastro::errors::ProviderError;
use webastro::flows::InsightProvider;
use webastro::nav::Route;
use webastro::onboarding::BirthDetailsForm;
use webastro::session::{
    ChatSession, Completion, MessageContent, Mount, Sender, SessionState, APOLOGY,
};
use webastro::store::{MemoryProfileStore, ProfileStore};
use webastro::wire::{
    InsightRequest, InsightResponse, SuggestionsRequest, SuggestionsResponse, SummaryRequest,
    SummaryResponse,
};

#[derive(Default)]
struct FakeProvider {
    fail: bool,
    requests: Mutex<Vec<InsightRequest>>,
}

#[async_trait]
impl InsightProvider for FakeProvider {
    async fn get_insights(&self, req: &InsightRequest) -> Result<InsightResponse, ProviderError> {
        self.requests.lock().push(req.clone());
        if self.fail {
            return Err(ProviderError::Status { status: 503, body: "unavailable".into() });
        }
        Ok(InsightResponse {
            personality_insights: "Steady and warm.".into(),
            life_path_insights: "Build things that last.".into(),
            current_transit_insights: "A good week to start.".into(),
            direct_answer: req.user_query.as_ref().map(|_| "Teaching and craft.".to_string()),
        })
    }

    async fn get_suggestions(&self, _req: &SuggestionsRequest) -> Result<SuggestionsResponse, ProviderError> {
        Ok(SuggestionsResponse {
            suggestions: vec![
                "What's my life path?".into(),
                "Will I travel this year?".into(),
                "What suits my career?".into(),
                "How is my week?".into(),
            ],
        })
    }

    async fn summarize(&self, _req: &SummaryRequest) -> Result<SummaryResponse, ProviderError> {
        Ok(SummaryResponse { summary: "Short.".into() })
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn now() -> NaiveDateTime {
    today().and_hms_opt(9, 45, 12).unwrap()
}

fn london_form() -> BirthDetailsForm {
    BirthDetailsForm::new("1990-05-15", "14:30", "London, UK", "English")
}

fn ready_session(store: &MemoryProfileStore) -> ChatSession {
    london_form().submit(store, today()).unwrap();
    let mut session = ChatSession::new();
    assert_eq!(session.mount(store), Mount::Ready);
    session
}

#[test]
fn onboarding_round_trips_through_the_slot() {
    let store = MemoryProfileStore::new();
    let sub = london_form().submit(&store, today()).unwrap();
    assert_eq!(sub.route, Route::Chat);
    assert_eq!(store.load().unwrap(), Some(sub.profile));
}

#[test]
fn saved_details_always_open_a_ready_chat() {
    let store = MemoryProfileStore::new();
    let blank = BirthDetailsForm::new("1990-05-15", "14:30", "   ", "English");
    assert!(blank.submit(&store, today()).is_err());
    assert!(store.raw().is_none());

    let padded = BirthDetailsForm::new("1990-05-15", "14:30", "  London, UK ", "English");
    padded.submit(&store, today()).unwrap();
    let mut session = ChatSession::new();
    assert_eq!(session.mount(&store), Mount::Ready);
    assert_eq!(session.profile().unwrap().location, "London, UK");
}

#[test]
fn repeated_onboarding_overwrites_the_slot() {
    let store = MemoryProfileStore::new();
    london_form().submit(&store, today()).unwrap();
    let first = store.raw();
    london_form().submit(&store, today()).unwrap();
    assert_eq!(store.raw(), first);

    BirthDetailsForm::new("1985-01-02", "06:05", "Pune, India", "Hindi")
        .submit(&store, today())
        .unwrap();
    let p = store.load().unwrap().unwrap();
    assert_eq!(p.location, "Pune, India");
}

#[tokio::test]
async fn profile_missing_any_field_redirects_without_calling_the_provider() {
    let full = serde_json::json!({
        "date": "1990-05-15",
        "time": "14:30",
        "location": "London, UK",
        "language": "English",
    });

    for field in ["date", "time", "location", "language"] {
        let mut removed = full.clone();
        removed.as_object_mut().unwrap().remove(field);
        let mut blank = full.clone();
        blank[field] = serde_json::json!("");

        for record in [removed, blank] {
            let store = MemoryProfileStore::with_raw(record.to_string());
            let provider = FakeProvider::default();
            let mut session = ChatSession::new();

            assert_eq!(session.mount(&store), Mount::Redirect(Route::GetStarted), "{record}");
            assert_eq!(session.state(), &SessionState::NoProfile, "{record}");
            let notices = session.drain_notices();
            assert_eq!(notices.len(), 1);
            assert!(notices[0].is_destructive());
            assert_eq!(notices[0].title, "Birth details required.");

            assert!(session.submit(&provider, "What's my life path?", now()).await.is_err());
            session.load_suggestions(&provider, None).await;
            assert!(provider.requests.lock().is_empty(), "{record}");
            assert!(session.visible_suggestions().is_empty());
        }
    }
}

#[tokio::test]
async fn question_carries_full_context_and_renders_answer_first() {
    let store = MemoryProfileStore::new();
    let provider = FakeProvider::default();
    let mut session = ready_session(&store);

    let done = session.submit(&provider, "What's my life path?", now()).await.unwrap();
    assert_eq!(done, Completion::Applied);

    let req = provider.requests.lock()[0].clone();
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["birthDate"], "1990-05-15");
    assert_eq!(json["birthTime"], "14:30");
    assert_eq!(json["birthLocation"], "London, UK");
    assert_eq!(json["currentDate"], "2026-10-19");
    assert_eq!(json["currentTime"], "09:45");
    assert_eq!(json["currentLocation"], "London, UK");
    assert_eq!(json["userQuery"], "What's my life path?");
    assert_eq!(json["language"], "English");

    let last = session.transcript().last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    let MessageContent::Insight(r) = &last.content else {
        panic!("expected an insight message");
    };
    let labels: Vec<_> = r.sections().iter().map(|s| s.label).collect();
    assert_eq!(labels, ["Answer", "Personality", "Life Path", "Current Influences"]);
}

#[tokio::test]
async fn provider_failure_adds_one_apology() {
    let store = MemoryProfileStore::new();
    let provider = FakeProvider { fail: true, ..Default::default() };
    let mut session = ready_session(&store);
    session.drain_notices();
    let before = session.transcript().len();

    session.submit(&provider, "Will I travel?", now()).await.unwrap();

    let added = &session.transcript()[before..];
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].sender, Sender::User);
    assert_eq!(added[1].text(), Some(APOLOGY));
    assert!(!session.is_busy());

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].is_destructive());
}

#[tokio::test]
async fn suggestions_show_three_until_the_first_question() {
    let store = MemoryProfileStore::new();
    let provider = FakeProvider::default();
    let mut session = ready_session(&store);

    session.load_suggestions(&provider, None).await;
    assert_eq!(session.visible_suggestions().len(), 3);

    session.accept_suggestion(&provider, 1, now()).await.unwrap();
    assert_eq!(provider.requests.lock()[0].user_query.as_deref(), Some("Will I travel this year?"));
    assert!(session.visible_suggestions().is_empty());
}

#[test]
fn result_after_close_is_dropped() {
    let store = MemoryProfileStore::new();
    let mut session = ready_session(&store);
    let pending = session.begin_submit("What's my life path?", now()).unwrap();
    let len = session.transcript().len();

    session.close();
    let late = Err(ProviderError::Malformed("late".into()));
    assert_eq!(session.complete(pending.token, late), Completion::Stale);
    assert_eq!(session.transcript().len(), len);
}
