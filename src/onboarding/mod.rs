//! Birth-details form: validate, persist to the profile slot, move on to chat.

use chrono::{Datelike, NaiveDate};
use std::borrow::Cow;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::errors::{FormErrors, OnboardingError};
use crate::nav::{Notice, Route};
use crate::profile::{BirthProfile, ClockTime, Language};
use crate::store::ProfileStore;

pub const EARLIEST_BIRTH_YEAR: i32 = 1900;

/// Raw text as typed by the user. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Validate)]
pub struct BirthDetailsForm {
    pub birth_date: String,
    #[validate(custom(function = "validate_birth_time"))]
    pub birth_time: String,
    #[validate(custom(function = "validate_birth_location"))]
    pub birth_location: String,
    #[validate(custom(function = "validate_language"))]
    pub language: String,
}

/// What a successful submit produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub profile: BirthProfile,
    pub notice: Notice,
    pub route: Route,
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_birth_time(value: &str) -> Result<(), ValidationError> {
    ClockTime::parse(value)
        .map(|_| ())
        .map_err(|_| with_message("time", "Please enter a valid time in HH:MM (24-hour) format."))
}

/// Surrounding whitespace does not count towards the minimum.
fn validate_birth_location(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() < 3 {
        return Err(with_message("length", "Birth location must be at least 3 characters."));
    }
    Ok(())
}

fn validate_language(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(with_message("required", "Please select a language."));
    }
    Language::from_name(value)
        .map(|_| ())
        .ok_or_else(|| with_message("language", "Please select a supported language."))
}

/// Calendar-valid, not after `today`, not before 1900-01-01.
pub fn check_birth_date(value: &str, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    if value.trim().is_empty() {
        return Err("A birth date is required.");
    }
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Please enter a valid date in YYYY-MM-DD format.")?;
    if date > today {
        return Err("Birth date cannot be in the future.");
    }
    if date.year() < EARLIEST_BIRTH_YEAR {
        return Err("Birth date cannot be before 1900.");
    }
    Ok(date)
}

impl BirthDetailsForm {
    pub fn new(
        birth_date: impl Into<String>,
        birth_time: impl Into<String>,
        birth_location: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            birth_date: birth_date.into(),
            birth_time: birth_time.into(),
            birth_location: birth_location.into(),
            language: language.into(),
        }
    }

    /// All field errors at once, the way the form shows them inline.
    pub fn to_profile(&self, today: NaiveDate) -> Result<BirthProfile, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors(Vec::new()),
            Err(e) => FormErrors::from_validation(&e),
        };
        let date = check_birth_date(&self.birth_date, today)
            .map_err(|msg| errors.push("birth_date", msg))
            .ok();

        let time = ClockTime::parse(&self.birth_time).ok();
        let language = Language::from_name(&self.language);
        match (date, time, language) {
            (Some(date), Some(time), Some(language)) if errors.is_empty() => {
                Ok(BirthProfile::new(date, time, self.birth_location.trim().to_string(), language))
            }
            _ => Err(errors),
        }
    }

    /// Validate and overwrite the profile slot. Nothing is written when validation fails.
    pub fn submit(&self, store: &dyn ProfileStore, today: NaiveDate) -> Result<Submission, OnboardingError> {
        let profile = self.to_profile(today)?;
        if let Err(e) = store.save(&profile) {
            warn!(error = %e, "saving birth details failed");
            return Err(e.into());
        }
        info!(date = %profile.date, language = %profile.language, "birth details saved");
        Ok(Submission {
            profile,
            notice: Notice::info(
                "Details Saved!",
                "We've securely stored your birth details and language preference.",
            ),
            route: Route::Chat,
        })
    }
}

impl OnboardingError {
    /// Toast for failures that are not inline field errors.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            OnboardingError::Invalid(_) => None,
            OnboardingError::Store(_) => Some(Notice::destructive(
                "Error",
                "Could not save your birth details. Please try again.",
            )),
        }
    }
}
