use chrono::{DateTime, Datelike, Days, Local, NaiveDate};

/// `m:ss` rendering used by the rest timer and the session clock.
pub fn format_clock(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Time-of-day label stored on sessions (`HH:MM`, 24h).
pub fn time_of_day(at: &DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Fresh opaque identifier. Never reused.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("gymtrack-backup-{}.json", date.format("%Y-%m-%d"))
}
