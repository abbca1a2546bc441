//! Read-side queries over a station's persisted schedule.

use crate::constants::DAY_NAMES;
use crate::error::Result;
use crate::storage::Storage;
use crate::types::{ScheduleEntry, WeeklySchedule};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};

/// Entries for one day, ordered by start time.
pub async fn day_listing(storage: &dyn Storage, station: &str, day: u8) -> Result<Vec<ScheduleEntry>> {
    let mut entries = storage.list_schedule_entries(station, day).await?;
    entries.sort_by_key(|e| e.start);
    Ok(entries)
}

/// The full persisted week for a station.
pub async fn week_listing(storage: &dyn Storage, station: &str) -> Result<WeeklySchedule> {
    let mut week = WeeklySchedule::new();
    for day in 0..DAY_NAMES.len() as u8 {
        week.set_day(day, day_listing(storage, station, day).await?)?;
    }
    Ok(week)
}

/// The show on air at `at`: the latest start on that weekday not after
/// `at`'s hour and minute. Shows from the previous day never carry over.
pub async fn current_entry(
    storage: &dyn Storage,
    station: &str,
    at: NaiveDateTime,
) -> Result<Option<ScheduleEntry>> {
    let day = at.weekday().num_days_from_monday() as u8;
    let now = NaiveTime::from_hms_opt(at.hour(), at.minute(), 0).unwrap_or(at.time());

    Ok(day_listing(storage, station, day)
        .await?
        .into_iter()
        .filter(|entry| entry.start <= now)
        .last())
}
