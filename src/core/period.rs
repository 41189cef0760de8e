//! Settlement period math.
//!
//! A group's period starts on its `month_start_day` (1-28) and runs until the same day
//! of the following month. Ranges are half-open: `start <= t < end`.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Smallest and largest accepted `month_start_day`
pub const START_DAY_RANGE: std::ops::RangeInclusive<i32> = 1..=28;
/// Years a `YYYY-MM` label may name
pub const LABEL_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// A half-open UTC time range with a `YYYY-MM` label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Period containing `today` for a group whose periods start on `start_day`.
    ///
    /// Out-of-range start days fall back to 1.
    #[must_use]
    pub fn containing(start_day: i32, today: DateTime<Utc>) -> Self {
        let day = normalize_start_day(start_day);
        let (mut year, mut month) = (today.year(), today.month());
        if today.day() < day {
            (year, month) = previous_month(year, month);
        }
        Self::for_month(year, month, start_day)
    }

    /// Period labelled `year-month` starting on `start_day`.
    #[must_use]
    pub fn for_month(year: i32, month: u32, start_day: i32) -> Self {
        let day = normalize_start_day(start_day);
        let (next_year, next_month) = next_month(year, month);
        Self {
            start: midnight(year, month, day),
            end: midnight(next_year, next_month, day),
            year,
            month,
        }
    }

    /// Period for a `YYYY-MM` label; `None` when the label is malformed.
    #[must_use]
    pub fn from_label(label: &str, start_day: i32) -> Option<Self> {
        let (year, month) = label.trim().split_once('-')?;
        let year = year.parse::<i32>().ok().filter(|y| LABEL_YEAR_RANGE.contains(y))?;
        let month = month.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
        Some(Self::for_month(year, month, start_day))
    }

    /// `YYYY-MM` label of the month the period starts in
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[allow(clippy::cast_sign_loss)]
fn normalize_start_day(start_day: i32) -> u32 {
    if START_DAY_RANGE.contains(&start_day) {
        start_day as u32
    } else {
        1
    }
}

const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year.saturating_sub(1), 12) } else { (year, month - 1) }
}

const fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year.saturating_add(1), 1) } else { (year, month + 1) }
}

fn midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    // Day is clamped to 1..=28 so every month has it.
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(DateTime::<Utc>::MIN_UTC, |naive| Utc.from_utc_datetime(&naive))
}
