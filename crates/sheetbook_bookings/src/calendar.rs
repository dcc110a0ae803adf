// --- File: crates/sheetbook_bookings/src/calendar.rs ---
//! Event start/end times for confirmation pages.
//!
//! Event sheets hold human-entered dates (`DD/MM/YYYY`) and times
//! (`H:MM AM/PM`, sometimes 24h). Both are read as UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use tracing::debug;

pub const DEFAULT_DURATION_HOURS: i64 = 2;
const FALLBACK_HOUR: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventWindow {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::hours(DEFAULT_DURATION_HOURS),
        }
    }

    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// Accepts `10:00 AM`, `1:30pm`, `10AM` and `14:15`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let mut compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    // "10AM" has no minutes; chrono needs them.
    if !compact.contains(':') && (compact.ends_with("AM") || compact.ends_with("PM")) {
        compact.insert_str(compact.len() - 2, ":00");
    }
    ["%I:%M%p", "%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&compact, fmt).ok())
}

/// Start and end of an event. Never fails: unparseable input falls back to
/// 10:00 UTC on the day after `now`.
pub fn event_window(date: Option<&str>, time: Option<&str>, now: DateTime<Utc>) -> EventWindow {
    let parsed = date
        .and_then(parse_date)
        .zip(time.and_then(parse_time))
        .map(|(d, t)| NaiveDateTime::new(d, t).and_utc());
    match parsed {
        Some(start) => EventWindow::starting_at(start),
        None => {
            debug!(
                "Unparseable event date/time ({:?}, {:?}); using fallback",
                date, time
            );
            EventWindow::starting_at(fallback_start(now))
        }
    }
}

fn fallback_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    tomorrow
        .and_hms_opt(FALLBACK_HOUR, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}
