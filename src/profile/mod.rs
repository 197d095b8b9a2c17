//! Birth profile: the one record the app keeps about its user.

use chrono::{NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// 24-hour `HH:MM`.
pub const TIME_PATTERN: &str = r"^([01]\d|2[0-3]):([0-5]\d)$";

fn time_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIME_PATTERN).expect("TIME_PATTERN is a valid regex"))
}

/// Languages insights can be generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Kannada,
    Telugu,
    Marathi,
    Gujarati,
    Bengali,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::Hindi,
        Language::Kannada,
        Language::Telugu,
        Language::Marathi,
        Language::Gujarati,
        Language::Bengali,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Kannada => "Kannada",
            Language::Telugu => "Telugu",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Bengali => "Bengali",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock time with minute precision, always rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTime(pub String);

impl fmt::Display for InvalidTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a 24-hour HH:MM time", self.0)
    }
}

impl std::error::Error for InvalidTime {}

impl ClockTime {
    pub fn parse(s: &str) -> Result<Self, InvalidTime> {
        let caps = time_pattern()
            .captures(s)
            .ok_or_else(|| InvalidTime(s.to_string()))?;
        let hour: u32 = caps[1].parse().map_err(|_| InvalidTime(s.to_string()))?;
        let minute: u32 = caps[2].parse().map_err(|_| InvalidTime(s.to_string()))?;
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(ClockTime)
            .ok_or_else(|| InvalidTime(s.to_string()))
    }

    /// Drops seconds and below.
    pub fn from_time(t: NaiveTime) -> Self {
        ClockTime(NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = InvalidTime;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&s)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// Natal details plus the language answers should come back in.
///
/// Deserialization goes through [`StoredProfile`] so a record missing any field
/// (or holding an empty one) is rejected rather than half-loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredProfile")]
pub struct BirthProfile {
    pub date: NaiveDate,
    pub time: ClockTime,
    pub location: String,
    pub language: Language,
}

impl BirthProfile {
    pub fn new(date: NaiveDate, time: ClockTime, location: impl Into<String>, language: Language) -> Self {
        Self { date, time, location: location.into(), language }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredProfile {
    date: Option<String>,
    time: Option<String>,
    location: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteProfile {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for IncompleteProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "profile field `{}` {}", self.field, self.reason)
    }
}

impl std::error::Error for IncompleteProfile {}

fn required(field: &'static str, v: Option<String>) -> Result<String, IncompleteProfile> {
    match v {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(IncompleteProfile { field, reason: "is missing".into() }),
    }
}

impl TryFrom<StoredProfile> for BirthProfile {
    type Error = IncompleteProfile;

    fn try_from(raw: StoredProfile) -> Result<Self, Self::Error> {
        let date = required("date", raw.date)?;
        let time = required("time", raw.time)?;
        let location = required("location", raw.location)?;
        let language = required("language", raw.language)?;

        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| IncompleteProfile {
            field: "date",
            reason: format!("is not a calendar date ({e})"),
        })?;
        let time = ClockTime::parse(time.trim()).map_err(|e| IncompleteProfile {
            field: "time",
            reason: e.to_string(),
        })?;
        let language = Language::from_name(&language).ok_or_else(|| IncompleteProfile {
            field: "language",
            reason: format!("'{language}' is not supported"),
        })?;

        Ok(BirthProfile { date, time, location, language })
    }
}
