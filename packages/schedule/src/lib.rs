#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Monthly calendars derived from recurring weekly or rotating patterns.
//!
//! All arithmetic is on civil dates ([`NaiveDate`]), so day differences
//! are whole calendar days and daylight-saving transitions cannot shift
//! a rotation's phase.
//!
//! Months are 0-indexed (0 = January) throughout, matching the API.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use precinct_map_jurisdiction_models::DayHours;
use precinct_map_schedule_models::{PatternType, RdoSchedule};

/// Day of month (1-based) to on-duty flag.
pub type DutyMonth = BTreeMap<u32, bool>;

/// Number of days in a 0-indexed month, or `None` for an invalid month
/// or out-of-range year.
#[must_use]
pub fn days_in_month(year: i32, month0: u32) -> Option<u32> {
    if month0 > 11 {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    let next_first = if month0 == 11 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month0 + 2, 1)?
    };
    u32::try_from((next_first - first).num_days()).ok()
}

/// Whether a schedule is usable at all. Rejected schedules produce empty
/// calendars.
fn is_usable(schedule: &RdoSchedule) -> bool {
    if schedule.pattern_array.is_empty() {
        return false;
    }
    match schedule.pattern_type {
        PatternType::Rotating => schedule.cycle_length > 0,
        PatternType::Steady => true,
    }
}

/// Pattern index for `date`, or `None` if the schedule is unusable.
#[must_use]
pub fn pattern_index(date: NaiveDate, schedule: &RdoSchedule) -> Option<usize> {
    if !is_usable(schedule) {
        return None;
    }
    match schedule.pattern_type {
        PatternType::Rotating => {
            let diff_days = (date - schedule.anchor_date).num_days();
            let index = diff_days
                .checked_add(schedule.squad_offset)?
                .rem_euclid(schedule.cycle_length);
            usize::try_from(index).ok()
        }
        PatternType::Steady => usize::try_from(date.weekday().num_days_from_sunday()).ok(),
    }
}

/// Whether the squad is on duty on `date`. `None` if the schedule is
/// unusable.
#[must_use]
pub fn is_on_duty(date: NaiveDate, schedule: &RdoSchedule) -> Option<bool> {
    pattern_index(date, schedule).map(|index| !schedule.is_off_at(index))
}

/// Computes on-duty status for every day of a 0-indexed month.
///
/// Returns an empty map for an invalid month or an unusable schedule
/// (empty pattern, non-positive rotating cycle).
#[must_use]
pub fn month_schedule(year: i32, month0: u32, schedule: &RdoSchedule) -> DutyMonth {
    let Some(days) = days_in_month(year, month0) else {
        log::debug!("Rejected schedule request for invalid month {year}-{month0}");
        return DutyMonth::new();
    };
    if !is_usable(schedule) {
        log::debug!(
            "Schedule {} for squad {} is unusable (pattern len {}, cycle {})",
            schedule.schedule_id,
            schedule.squad_id,
            schedule.pattern_array.len(),
            schedule.cycle_length
        );
        return DutyMonth::new();
    }

    (1..=days)
        .filter_map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month0 + 1, day)?;
            is_on_duty(date, schedule).map(|on_duty| (day, on_duty))
        })
        .collect()
}

/// Maps each day of a 0-indexed month to the opening-hours entry for its
/// weekday. Days whose weekday has no entry are omitted.
#[must_use]
pub fn month_opening_hours(year: i32, month0: u32, hours: &[DayHours]) -> BTreeMap<u32, DayHours> {
    let Some(days) = days_in_month(year, month0) else {
        return BTreeMap::new();
    };

    (1..=days)
        .filter_map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month0 + 1, day)?;
            let weekday = usize::try_from(date.weekday().num_days_from_sunday()).ok()?;
            hours.get(weekday).map(|entry| (day, entry.clone()))
        })
        .collect()
}
