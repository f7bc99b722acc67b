//! The window of calendar days a run targets.

use chrono::{Days, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Store and provider key for a day.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `days` consecutive dates, oldest first. The window ends on `today`, or on
/// the day before when `include_today` is false.
pub fn target_dates(today: NaiveDate, days: u32, include_today: bool) -> Vec<NaiveDate> {
    let last = if include_today {
        Some(today)
    } else {
        today.checked_sub_days(Days::new(1))
    };
    let Some(last) = last else {
        return Vec::new();
    };
    (0..u64::from(days))
        .rev()
        .filter_map(|back| last.checked_sub_days(Days::new(back)))
        .collect()
}
