use chrono::{Local, NaiveDateTime};

use crate::profile::{BirthProfile, ClockTime};

/// The "now" half of an insight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentContext {
    pub date: chrono::NaiveDate,
    pub time: ClockTime,
    pub location: String,
}

/// Resolve the current date, time and place for a request.
///
/// The place is the configured override when one is set, otherwise the birth
/// location stands in for it.
pub fn current_context(
    profile: &BirthProfile,
    location_override: Option<&str>,
    now: NaiveDateTime,
) -> CurrentContext {
    let location = location_override
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(&profile.location)
        .to_string();
    CurrentContext {
        date: now.date(),
        time: ClockTime::from_time(now.time()),
        location,
    }
}

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Language;
    use chrono::NaiveDate;

    fn profile() -> BirthProfile {
        BirthProfile::new(
            NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            ClockTime::parse("14:30").unwrap(),
            "London, UK",
            Language::English,
        )
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(21, 7, 42).unwrap()
    }

    #[test]
    fn birth_location_stands_in_by_default() {
        let ctx = current_context(&profile(), None, now());
        assert_eq!(ctx.location, "London, UK");
        assert_eq!(ctx.date.to_string(), "2026-10-19");
        assert_eq!(ctx.time.to_string(), "21:07");
    }

    #[test]
    fn override_wins_unless_blank() {
        assert_eq!(current_context(&profile(), Some("Pune, India"), now()).location, "Pune, India");
        assert_eq!(current_context(&profile(), Some("  "), now()).location, "London, UK");
    }
}
