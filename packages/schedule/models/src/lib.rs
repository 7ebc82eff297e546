#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Squad and regular-day-off (RDO) schedule types.
//!
//! Field names serialize in `camelCase` to match the reference data
//! tables (`squads.json`, `rdo_schedules.json`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day code marking an off-duty day in a pattern.
pub const OFF_DAY_CODE: &str = "O";

/// A named duty group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Squad {
    pub squad_id: u32,
    pub squad_name: String,
    /// Sort key for listing squads.
    pub display_order: i32,
}

/// How a schedule's pattern array is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Indexed by days elapsed since the anchor date, modulo the cycle.
    Rotating,
    /// Indexed by weekday, 0 = Sunday.
    Steady,
}

/// A squad's recurring duty pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdoSchedule {
    pub schedule_id: u32,
    pub squad_id: u32,
    pub pattern_type: PatternType,
    /// Cycle length in days. Only meaningful for [`PatternType::Rotating`].
    pub cycle_length: i64,
    /// One code per day; [`OFF_DAY_CODE`] marks a day off.
    pub pattern_array: Vec<String>,
    /// Day index zero of a rotating cycle (`YYYY-MM-DD`).
    pub anchor_date: NaiveDate,
    /// Phase shift added to the day index.
    pub squad_offset: i64,
}

impl RdoSchedule {
    /// Whether the pattern entry at `index` is an off day. Indices past
    /// the end of the pattern are never off.
    #[must_use]
    pub fn is_off_at(&self, index: usize) -> bool {
        self.pattern_array
            .get(index)
            .is_some_and(|code| code == OFF_DAY_CODE)
    }
}
