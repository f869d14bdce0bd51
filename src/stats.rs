use crate::model::WorkoutSession;
use crate::util::{format_clock, week_start};
use chrono::{Days, NaiveDate, NaiveTime};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Longest run of days the streak walk will look back over.
pub const STREAK_WINDOW_DAYS: u32 = 365;

/// Headline numbers for the home screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_completed_sessions: usize,
    pub this_week_count: usize,
    pub total_completed_sets: usize,
    pub streak: u32,
}

/// Full scan over the history.
pub fn compute_stats(sessions: &[WorkoutSession], today: NaiveDate) -> WorkoutStats {
    let monday = week_start(today);
    let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);

    let finished_dates: BTreeSet<NaiveDate> = sessions
        .iter()
        .filter(|s| s.is_complete())
        .map(|s| s.date)
        .collect();

    WorkoutStats {
        total_completed_sessions: sessions.iter().filter(|s| s.is_complete()).count(),
        this_week_count: sessions
            .iter()
            .filter(|s| s.date >= monday && s.date <= sunday)
            .count(),
        total_completed_sets: sessions.iter().map(WorkoutSession::completed_sets).sum(),
        streak: streak(&finished_dates, today),
    }
}

/// Consecutive days with a finished session, counted back from today. A day
/// that has not been logged yet does not break the streak: the walk then
/// starts from yesterday.
pub fn streak(finished_dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = today;
    for i in 0..STREAK_WINDOW_DAYS {
        if finished_dates.contains(&day) {
            count += 1;
        } else if i != 0 {
            break;
        }
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}

/// Per-session numbers shown in the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exercises: usize,
    pub completed_sets: usize,
    pub total_sets: usize,
    pub volume_kg: f64,
    pub duration_label: Option<String>,
}

pub fn summarize(session: &WorkoutSession) -> SessionSummary {
    SessionSummary {
        exercises: session.exercises.len(),
        completed_sets: session.completed_sets(),
        total_sets: session.total_sets(),
        volume_kg: session
            .exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .map(|s| s.volume())
            .sum(),
        duration_label: duration_label(session),
    }
}

/// Wall-clock span between the stored start and end times, `m:ss`.
fn duration_label(session: &WorkoutSession) -> Option<String> {
    let end = session.end_time.as_deref()?;
    let start = NaiveTime::parse_from_str(&session.start_time, "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
    let secs = (end - start).num_seconds();
    // finished after midnight
    let secs = if secs < 0 { secs + 86_400 } else { secs };
    Some(format_clock(secs as u64))
}

/// Sessions per calendar day, for calendar views.
pub fn sessions_per_day(sessions: &[WorkoutSession]) -> BTreeMap<NaiveDate, usize> {
    sessions
        .iter()
        .map(|s| s.date)
        .counts()
        .into_iter()
        .collect()
}

/// Distinct finished-session dates, newest first.
pub fn finished_dates_desc(sessions: &[WorkoutSession]) -> Vec<NaiveDate> {
    sessions
        .iter()
        .filter(|s| s.is_complete())
        .map(|s| s.date)
        .unique()
        .sorted_by(|a, b| b.cmp(a))
        .collect()
}
