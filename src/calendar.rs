use crate::models::{Habit, JournalEntry};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cells in a month view: six full Monday-first weeks.
pub const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

pub fn parse_day(raw: &str) -> Result<NaiveDate, CalendarError> {
    let trimmed = raw.trim();
    if trimmed.len() != 10 {
        return Err(CalendarError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| CalendarError::InvalidDate(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(CalendarError::InvalidMonth(format!("{year}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month.
    pub fn next_first_day(self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for YearMonth {
    type Err = CalendarError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidMonth(raw.to_string());
        let trimmed = raw.trim();
        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub is_other_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub has_activity: bool,
    pub activity_count: u32,
}

/// Lay out `month` (1-based) as a fixed grid of [`GRID_CELLS`] days starting
/// on the Monday on or before the 1st.
pub fn build_grid(
    year: i32,
    month: u32,
    today: &str,
    selected: &str,
    activity: &BTreeMap<NaiveDate, u32>,
) -> Result<Vec<DayCell>, CalendarError> {
    let month = YearMonth::new(year, month)?;
    let today = parse_day(today)?;
    let selected = parse_day(selected)?;
    Ok(grid_for(month, today, selected, activity))
}

pub fn grid_for(
    month: YearMonth,
    today: NaiveDate,
    selected: NaiveDate,
    activity: &BTreeMap<NaiveDate, u32>,
) -> Vec<DayCell> {
    let first = month.first_day();
    let offset = first.weekday().num_days_from_monday();
    let start = first - Duration::days(i64::from(offset));

    (0..GRID_CELLS)
        .map(|index| {
            let date = start + Duration::days(index as i64);
            let count = activity.get(&date).copied().unwrap_or(0);
            DayCell {
                date,
                day: date.day(),
                is_other_month: !month.contains(date),
                is_today: date == today,
                is_selected: date == selected,
                has_activity: count > 0,
                activity_count: count,
            }
        })
        .collect()
}

/// Per-day activity in `month`: stored habit records (unchecked boxes
/// excluded) plus journal entries.
pub fn activity_counts(
    habits: &[Habit],
    entries: &[JournalEntry],
    month: YearMonth,
) -> BTreeMap<NaiveDate, u32> {
    let range = month.first_day()..month.next_first_day();
    let mut counts = BTreeMap::new();

    for habit in habits {
        for (date, record) in habit.records.range(range.clone()) {
            if record.is_active() {
                *counts.entry(*date).or_insert(0) += 1;
            }
        }
    }
    for entry in entries.iter().filter(|entry| range.contains(&entry.date)) {
        *counts.entry(entry.date).or_insert(0) += 1;
    }

    counts
}
