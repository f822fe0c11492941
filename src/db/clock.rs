//! Timestamp formatting shared by every table.
//!
//! Timestamps are stored as fixed-width UTC RFC 3339 strings with microsecond
//! precision, so comparing the text compares the instants.

use chrono::{DateTime, Days, NaiveDate, SecondsFormat, Utc};

#[must_use]
pub fn format(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[must_use]
pub fn now() -> String {
    format(Utc::now())
}

#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// First instant of `day` (UTC).
#[must_use]
pub fn start_of_day(day: NaiveDate) -> String {
    format(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// First instant after `day` (UTC); used as an exclusive upper bound.
#[must_use]
pub fn start_of_next_day(day: NaiveDate) -> String {
    day.checked_add_days(Days::new(1))
        .map_or_else(|| "9999-12-31T23:59:59.999999Z".to_string(), start_of_day)
}
