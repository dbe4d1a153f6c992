//! Duration, earnings and weekly-progress math. Everything here is pure and
//! takes `now` explicitly; nothing reads the system clock.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::models::{Project, TimeSession};

/// Format a second count as zero-padded `HH:MM:SS`. Hours are unbounded and
/// may exceed two digits.
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Whole seconds elapsed between two millisecond timestamps, never negative.
pub fn elapsed_since_start(start_ms: i64, now_ms: i64) -> i64 {
    ((now_ms - start_ms) / 1000).max(0)
}

/// Seconds contributed by the live timer, zero when stopped.
pub fn current_session_seconds(project: &Project, now_ms: i64) -> i64 {
    match project.start_time {
        Some(start) if project.is_running => elapsed_since_start(start, now_ms),
        _ => 0,
    }
}

/// Closed-session total plus whatever the running timer has accumulated.
pub fn total_display_seconds(project: &Project, now_ms: i64) -> i64 {
    project.total_time + current_session_seconds(project, now_ms)
}

/// Earnings for a second count at an hourly rate, rendered to two decimals.
pub fn earnings(total_seconds: i64, hourly_rate: f64) -> String {
    let hours = total_seconds as f64 / 3600.0;
    format!("{:.2}", hours * hourly_rate)
}

/// Monday 00:00:00.000 UTC of the week containing `now_ms`, in ms.
pub fn week_start_ms(now_ms: i64) -> i64 {
    let Some(now) = DateTime::<Utc>::from_timestamp_millis(now_ms) else {
        return 0;
    };
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_from_monday);
    monday.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Sum of durations for sessions that started in the current week, plus the
/// live timer's seconds. A session starting exactly at the week boundary
/// counts; one starting a millisecond earlier does not.
pub fn weekly_elapsed_seconds(
    sessions: &[TimeSession],
    current_session_seconds: i64,
    now_ms: i64,
) -> i64 {
    let week_start = week_start_ms(now_ms);
    let completed: i64 = sessions
        .iter()
        .filter(|s| s.start_time >= week_start)
        .map(|s| s.duration)
        .sum();
    completed + current_session_seconds
}

/// Weekly hours worked as a percentage of the committed hours, capped at 100.
pub fn weekly_progress_percent(weekly_elapsed_seconds: i64, committed_weekly_hours: f64) -> f64 {
    if committed_weekly_hours <= 0.0 {
        return 0.0;
    }
    let hours = weekly_elapsed_seconds as f64 / 3600.0;
    (hours / committed_weekly_hours * 100.0).min(100.0)
}
