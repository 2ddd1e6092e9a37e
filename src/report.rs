use crate::calendar::{CalendarError, YearMonth, parse_day};
use crate::models::{Aggregation, EntryId, Habit, HabitId, HabitKind, JournalEntry, Record};
use crate::records::record_qualifies;
use crate::tags::has_tag;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("unknown period '{0}', expected day, week, month, year or custom")]
    UnknownPeriod(String),
    #[error("custom period requires an end date")]
    MissingEnd,
    #[error("end {end} must be after start {start}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Date(#[from] CalendarError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    Custom,
}

impl FromStr for Period {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "custom" => Ok(Self::Custom),
            other => Err(ReportError::UnknownPeriod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Habit,
    Category,
    Rating,
    Percent,
    Unrecognized,
}

impl SortKey {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "date" => Self::Date,
            "habit" => Self::Habit,
            "category" => Self::Category,
            "rating" => Self::Rating,
            "percent" => Self::Percent,
            _ => Self::Unrecognized,
        }
    }
}

/// Half-open range of days, `start` included and `end` excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn resolve(
        period: Period,
        base: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Self, ReportError> {
        let (start, end) = match period {
            Period::Day => (base, base + Duration::days(1)),
            Period::Week => {
                let monday =
                    base - Duration::days(i64::from(base.weekday().num_days_from_monday()));
                (monday, monday + Duration::weeks(1))
            }
            Period::Month => {
                let month = YearMonth::of(base);
                (month.first_day(), month.next_first_day())
            }
            Period::Year => (
                NaiveDate::from_ymd_opt(base.year(), 1, 1).unwrap_or(base),
                NaiveDate::from_ymd_opt(base.year() + 1, 1, 1).unwrap_or(NaiveDate::MAX),
            ),
            Period::Custom => (base, end.ok_or(ReportError::MissingEnd)?),
        };
        if end <= start {
            return Err(ReportError::EmptyWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub period: Period,
    /// The requested start date, before snapping to the period boundary.
    pub base: NaiveDate,
    pub window: DateWindow,
    pub sort: SortKey,
    pub tag: Option<String>,
}

impl ReportRequest {
    /// Build a request from raw query values. A missing `start` means today;
    /// `end` is only read for custom windows. Goal progress is reported for
    /// the month holding `start`, even when the window begins earlier.
    pub fn from_params(
        today: NaiveDate,
        period: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
        sort: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Self, ReportError> {
        let period = period.map_or(Ok(Period::Week), str::parse)?;
        let base = match start.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => parse_day(raw)?,
            None => today,
        };
        let end = match end.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Some(parse_day(raw)?),
            None => None,
        };
        let window = DateWindow::resolve(period, base, end)?;
        Ok(Self {
            period,
            base,
            window,
            sort: sort.map_or(SortKey::Date, SortKey::parse),
            tag: tag
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Streaks {
    pub current: u32,
    pub best: u32,
}

/// Streaks over a set of qualifying days. The current run ends today, or
/// yesterday while today has nothing recorded yet.
pub fn compute_streaks(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> Streaks {
    let mut best = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for &date in days {
        run = match previous {
            Some(prev) if date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(date);
    }

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut current = 0u32;
    while days.contains(&cursor) {
        current += 1;
        cursor -= Duration::days(1);
    }

    Streaks { current, best }
}

pub fn qualifying_days(habit: &Habit) -> BTreeSet<NaiveDate> {
    habit
        .records
        .iter()
        .filter(|(_, record)| record_qualifies(habit, record))
        .map(|(date, _)| *date)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalBand {
    Green,
    Orange,
    Red,
}

impl GoalBand {
    pub fn for_percent(percent: u32) -> Self {
        match percent {
            75.. => Self::Green,
            25.. => Self::Orange,
            _ => Self::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub habit_id: HabitId,
    pub habit: String,
    pub monthly_goal: u32,
    pub active: bool,
    pub done_count: u32,
    pub percent: u32,
    pub band: GoalBand,
}

pub fn goal_progress(habit: &Habit, month: YearMonth) -> Option<GoalProgress> {
    let goal = habit.monthly_goal.filter(|goal| *goal > 0)?;
    let done_count = habit
        .records
        .range(month.first_day()..month.next_first_day())
        .filter(|(_, record)| record_qualifies(habit, record))
        .count() as u32;
    let percent = (100.0 * f64::from(done_count) / f64::from(goal)).round() as u32;
    Some(GoalProgress {
        habit_id: habit.id,
        habit: habit.name.clone(),
        monthly_goal: goal,
        active: habit.active,
        done_count,
        percent,
        band: GoalBand::for_percent(percent),
    })
}

/// One habit's line in the report: period totals, streaks and, when the
/// habit has a monthly goal, its progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSummary {
    pub habit_id: HabitId,
    pub habit: String,
    pub kind: HabitKind,
    pub color: String,
    pub unit: Option<String>,
    pub count: u32,
    pub sum: Option<f64>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub monthly_goal: Option<u32>,
    pub done_count: Option<u32>,
    pub percent: Option<u32>,
    pub band: Option<GoalBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRow {
    pub date: NaiveDate,
    pub habit_id: HabitId,
    pub habit: String,
    pub kind: HabitKind,
    pub done: bool,
    pub time_min: Option<f64>,
    pub distance_km: Option<f64>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRow {
    pub id: EntryId,
    pub date: NaiveDate,
    pub text: String,
    pub category: Option<String>,
    pub checked: bool,
    pub rating: Option<u8>,
    pub tags: Vec<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReportRow {
    Habit(HabitRow),
    Journal(JournalRow),
}

impl ReportRow {
    fn date(&self) -> NaiveDate {
        match self {
            ReportRow::Habit(row) => row.date,
            ReportRow::Journal(row) => row.date,
        }
    }

    fn name_key(&self) -> String {
        match self {
            ReportRow::Habit(row) => row.habit.to_lowercase(),
            ReportRow::Journal(_) => String::new(),
        }
    }

    fn category_key(&self) -> String {
        match self {
            ReportRow::Habit(_) => String::new(),
            ReportRow::Journal(row) => row.category.as_deref().unwrap_or("").to_lowercase(),
        }
    }

    fn rating(&self) -> Option<u8> {
        match self {
            ReportRow::Habit(_) => None,
            ReportRow::Journal(row) => row.rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub period: Period,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub count: usize,
    pub goals_month: YearMonth,
    pub summary: Vec<HabitSummary>,
    pub goals: Vec<GoalProgress>,
    pub rows: Vec<ReportRow>,
}

pub fn build_report(
    today: NaiveDate,
    request: &ReportRequest,
    habits: &[Habit],
    entries: &[JournalEntry],
) -> Report {
    let window = request.window;
    let goals_month = YearMonth::of(request.base);
    let tag = request.tag.as_deref();

    let habits: Vec<&Habit> = habits
        .iter()
        .filter(|habit| habit.active)
        .filter(|habit| tag.is_none_or(|tag| has_tag(&habit.tags, tag)))
        .collect();

    let mut summary: Vec<HabitSummary> = habits
        .iter()
        .map(|habit| summarize(habit, window, today))
        .collect();
    let goals: Vec<GoalProgress> = habits
        .iter()
        .filter_map(|habit| goal_progress(habit, goals_month))
        .collect();
    merge_goals(&mut summary, &goals);
    sort_summary(&mut summary, request.sort);

    let mut rows: Vec<ReportRow> = habits
        .iter()
        .flat_map(|habit| habit_rows(habit, window))
        .collect();
    rows.extend(
        entries
            .iter()
            .filter(|entry| window.contains(entry.date))
            .filter(|entry| tag.is_none_or(|tag| has_tag(&entry.tags, tag)))
            .map(|entry| ReportRow::Journal(journal_row(entry))),
    );
    sort_rows(&mut rows, request.sort);

    Report {
        period: request.period,
        start: window.start,
        end: window.end,
        count: rows.len(),
        goals_month,
        summary,
        goals,
        rows,
    }
}

fn summarize(habit: &Habit, window: DateWindow, today: NaiveDate) -> HabitSummary {
    let in_window = habit.records.range(window.start..window.end);
    let count = in_window
        .clone()
        .filter(|(_, record)| record.is_active())
        .count() as u32;
    let sum = match habit.kind {
        HabitKind::Numeric => habit
            .aggregation
            .fold(in_window.filter_map(|(_, record)| match record {
                Record::Numeric { entries, .. } if habit.aggregation == Aggregation::Count => {
                    Some(f64::from(*entries))
                }
                Record::Numeric { value, .. } => Some(*value),
                _ => None,
            }))
            .map(round2),
        HabitKind::Checkbox | HabitKind::Metrics => None,
    };
    let streaks = compute_streaks(&qualifying_days(habit), today);

    HabitSummary {
        habit_id: habit.id,
        habit: habit.name.clone(),
        kind: habit.kind,
        color: habit.color.clone(),
        unit: habit.unit.clone(),
        count,
        sum,
        current_streak: streaks.current,
        best_streak: streaks.best,
        monthly_goal: None,
        done_count: None,
        percent: None,
        band: None,
    }
}

fn merge_goals(summary: &mut [HabitSummary], goals: &[GoalProgress]) {
    let by_id: HashMap<HabitId, &GoalProgress> =
        goals.iter().map(|goal| (goal.habit_id, goal)).collect();
    for row in summary.iter_mut() {
        if let Some(goal) = by_id.get(&row.habit_id) {
            row.monthly_goal = Some(goal.monthly_goal);
            row.done_count = Some(goal.done_count);
            row.percent = Some(goal.percent);
            row.band = Some(goal.band);
        }
    }
}

fn sort_summary(summary: &mut [HabitSummary], sort: SortKey) {
    match sort {
        SortKey::Habit => summary.sort_by(|a, b| {
            a.habit
                .to_lowercase()
                .cmp(&b.habit.to_lowercase())
                .then(a.habit.cmp(&b.habit))
                .then(a.habit_id.cmp(&b.habit_id))
        }),
        SortKey::Date | SortKey::Category | SortKey::Rating | SortKey::Percent => {
            summary.sort_by(|a, b| b.percent.unwrap_or(0).cmp(&a.percent.unwrap_or(0)))
        }
        SortKey::Unrecognized => {}
    }
}

fn sort_rows(rows: &mut [ReportRow], sort: SortKey) {
    match sort {
        SortKey::Date => rows.sort_by(|a, b| {
            a.date()
                .cmp(&b.date())
                .then_with(|| a.name_key().cmp(&b.name_key()))
        }),
        SortKey::Habit => rows.sort_by(|a, b| {
            a.name_key()
                .cmp(&b.name_key())
                .then_with(|| a.date().cmp(&b.date()))
        }),
        SortKey::Category => rows.sort_by(|a, b| {
            a.category_key()
                .cmp(&b.category_key())
                .then_with(|| a.date().cmp(&b.date()))
        }),
        SortKey::Rating => rows.sort_by(|a, b| match (a.rating(), b.rating()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortKey::Percent | SortKey::Unrecognized => {}
    }
}

fn habit_rows(habit: &Habit, window: DateWindow) -> Vec<ReportRow> {
    habit
        .records
        .range(window.start..window.end)
        .map(|(date, record)| {
            let (time_min, distance_km, value) = match record {
                Record::Checkbox(_) => (None, None, None),
                Record::Metrics(metrics) => {
                    (Some(metrics.time_min), Some(metrics.distance_km), None)
                }
                Record::Numeric { value, .. } => (None, None, Some(*value)),
            };
            ReportRow::Habit(HabitRow {
                date: *date,
                habit_id: habit.id,
                habit: habit.name.clone(),
                kind: habit.kind,
                done: record_qualifies(habit, record),
                time_min,
                distance_km,
                value,
                unit: habit.unit.clone(),
                tags: habit.tags.clone(),
            })
        })
        .collect()
}

fn journal_row(entry: &JournalEntry) -> JournalRow {
    JournalRow {
        id: entry.id,
        date: entry.date,
        text: entry.text.clone(),
        category: entry.category.clone(),
        checked: entry.checked,
        rating: entry.rating,
        tags: entry.tags.clone(),
        link: entry.link.clone(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metrics;
    use crate::records::tests::{day, habit};

    fn request(period: &str, start: &str, sort: &str, tag: Option<&str>) -> ReportRequest {
        ReportRequest::from_params(
            day("2025-08-22"),
            Some(period),
            Some(start),
            None,
            Some(sort),
            tag,
        )
        .unwrap()
    }

    fn checked(name: &str, id: HabitId, days: &[&str]) -> Habit {
        let mut habit = habit(id, name, HabitKind::Checkbox);
        for raw in days {
            habit.records.insert(day(raw), Record::Checkbox(true));
        }
        habit
    }

    fn entry(id: EntryId, date: &str, rating: Option<u8>, tags: &[&str]) -> JournalEntry {
        JournalEntry {
            id,
            date: day(date),
            text: format!("entry {id}"),
            link: None,
            category: Some("book".to_string()),
            checked: false,
            rating,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[test]
    fn current_streak_counts_back_from_today() {
        let read = checked("Read", 1, &["2025-08-20", "2025-08-21", "2025-08-22"]);
        let streaks = compute_streaks(&qualifying_days(&read), day("2025-08-22"));
        assert_eq!(streaks.current, 3);
        assert!(streaks.best >= streaks.current);
    }

    #[test]
    fn current_streak_survives_until_today_is_recorded() {
        let days = qualifying_days(&checked("Read", 1, &["2025-08-20", "2025-08-21"]));
        assert_eq!(compute_streaks(&days, day("2025-08-22")).current, 2);
        assert_eq!(compute_streaks(&days, day("2025-08-23")).current, 0);
    }

    #[test]
    fn best_streak_spans_full_history() {
        let read = checked(
            "Read",
            1,
            &[
                "2025-06-29",
                "2025-06-30",
                "2025-07-01",
                "2025-07-02",
                "2025-08-21",
                "2025-08-22",
            ],
        );
        let streaks = compute_streaks(&qualifying_days(&read), day("2025-08-22"));
        assert_eq!(streaks, Streaks { current: 2, best: 4 });
        assert_eq!(compute_streaks(&BTreeSet::new(), day("2025-08-22")), Streaks::default());
    }

    #[test]
    fn unchecked_days_break_streaks() {
        let mut read = checked("Read", 1, &["2025-08-20", "2025-08-22"]);
        read.records.insert(day("2025-08-21"), Record::Checkbox(false));
        let streaks = compute_streaks(&qualifying_days(&read), day("2025-08-22"));
        assert_eq!(streaks, Streaks { current: 1, best: 1 });
    }

    #[test]
    fn goal_progress_rounds_percent() {
        let mut read = checked(
            "Read",
            1,
            &[
                "2025-08-01",
                "2025-08-02",
                "2025-08-03",
                "2025-08-10",
                "2025-08-11",
                "2025-08-12",
                "2025-07-31",
            ],
        );
        read.monthly_goal = Some(10);
        let progress = goal_progress(&read, "2025-08".parse().unwrap()).unwrap();
        assert_eq!(progress.done_count, 6);
        assert_eq!(progress.percent, 60);
        assert_eq!(progress.band, GoalBand::Orange);

        read.monthly_goal = Some(3);
        let over = goal_progress(&read, "2025-08".parse().unwrap()).unwrap();
        assert_eq!(over.percent, 200);
        assert_eq!(over.band, GoalBand::Green);

        read.monthly_goal = None;
        assert!(goal_progress(&read, "2025-08".parse().unwrap()).is_none());
    }

    #[test]
    fn windows_resolve_per_period() {
        let friday = day("2025-08-22");
        assert_eq!(
            DateWindow::resolve(Period::Week, friday, None).unwrap(),
            DateWindow {
                start: day("2025-08-18"),
                end: day("2025-08-25")
            }
        );
        assert_eq!(
            DateWindow::resolve(Period::Month, day("2025-12-05"), None).unwrap(),
            DateWindow {
                start: day("2025-12-01"),
                end: day("2026-01-01")
            }
        );
        assert_eq!(
            DateWindow::resolve(Period::Day, friday, None).unwrap().end,
            day("2025-08-23")
        );
        assert_eq!(
            DateWindow::resolve(Period::Custom, friday, None),
            Err(ReportError::MissingEnd)
        );
        assert!(matches!(
            DateWindow::resolve(Period::Custom, friday, Some(friday)),
            Err(ReportError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn bad_params_are_rejected() {
        let today = day("2025-08-22");
        assert!(matches!(
            ReportRequest::from_params(today, Some("fortnight"), None, None, None, None),
            Err(ReportError::UnknownPeriod(_))
        ));
        assert!(matches!(
            ReportRequest::from_params(today, Some("week"), Some("22/08/2025"), None, None, None),
            Err(ReportError::Date(_))
        ));
        let defaults = ReportRequest::from_params(today, None, None, None, None, Some("  ")).unwrap();
        assert_eq!(defaults.period, Period::Week);
        assert_eq!(defaults.sort, SortKey::Date);
        assert_eq!(defaults.tag, None);
    }

    #[test]
    fn empty_inputs_give_empty_report() {
        let report = build_report(
            day("2025-08-22"),
            &request("month", "2025-08-01", "habit", None),
            &[],
            &[],
        );
        assert_eq!(report.count, 0);
        assert!(report.summary.is_empty());
        assert!(report.goals.is_empty());
        assert!(report.rows.is_empty());
        assert_eq!(report.goals_month.to_string(), "2025-08");
    }

    #[test]
    fn summary_counts_sums_and_merges_goals_by_id() {
        let mut read = checked("Read", 1, &["2025-08-20", "2025-08-21", "2025-08-22"]);
        read.monthly_goal = Some(10);
        read.records.insert(day("2025-08-19"), Record::Checkbox(false));
        let mut twin = checked("Read", 2, &["2025-08-22"]);
        twin.monthly_goal = Some(2);

        let mut water = habit(3, "Water", HabitKind::Numeric);
        water.unit = Some("l".to_string());
        water.records.insert(
            day("2025-08-21"),
            Record::Numeric {
                value: 1.25,
                entries: 1,
            },
        );
        water.records.insert(
            day("2025-08-22"),
            Record::Numeric {
                value: 2.0,
                entries: 1,
            },
        );
        water.records.insert(
            day("2025-07-01"),
            Record::Numeric {
                value: 9.0,
                entries: 1,
            },
        );

        let report = build_report(
            day("2025-08-22"),
            &request("week", "2025-08-22", "unknown", None),
            &[read, twin, water],
            &[],
        );

        let ids: Vec<HabitId> = report.summary.iter().map(|row| row.habit_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let first = &report.summary[0];
        assert_eq!(first.count, 3);
        assert_eq!(first.current_streak, 3);
        assert_eq!(first.percent, Some(30));
        assert_eq!(first.sum, None);

        let second = &report.summary[1];
        assert_eq!(second.monthly_goal, Some(2));
        assert_eq!(second.percent, Some(50));

        let third = &report.summary[2];
        assert_eq!(third.sum, Some(3.25));
        assert_eq!(third.count, 2);
        assert_eq!(third.percent, None);

        assert_eq!(report.goals.len(), 2);
        assert_eq!(report.count, report.rows.len());
        assert_eq!(report.rows.len(), 7);
    }

    #[test]
    fn week_crossing_month_reports_goals_of_start_month() {
        let mut read = checked("Read", 1, &["2025-09-30", "2025-10-01"]);
        read.monthly_goal = Some(4);

        let report = build_report(
            day("2025-10-01"),
            &request("week", "2025-10-01", "habit", None),
            &[read],
            &[],
        );

        assert_eq!(report.start, day("2025-09-29"));
        assert_eq!(report.goals_month.to_string(), "2025-10");
        assert_eq!(report.goals[0].done_count, 1);
        let row = &report.summary[0];
        assert_eq!(row.count, 2);
        assert_eq!(row.done_count, Some(1));
        assert_eq!(row.percent, Some(25));
    }

    #[test]
    fn count_aggregation_counts_entries_not_values() {
        let mut minutes = habit(1, "Meditation", HabitKind::Numeric);
        minutes.aggregation = Aggregation::Count;
        minutes.records.insert(
            day("2025-08-21"),
            Record::Numeric {
                value: 30.0,
                entries: 1,
            },
        );
        minutes.records.insert(
            day("2025-08-22"),
            Record::Numeric {
                value: 45.0,
                entries: 1,
            },
        );
        let mut sets = habit(2, "Sets", HabitKind::Numeric);
        sets.aggregation = Aggregation::Count;
        sets.allow_multi = true;
        sets.records.insert(
            day("2025-08-22"),
            Record::Numeric {
                value: 3.0,
                entries: 3,
            },
        );

        let report = build_report(
            day("2025-08-22"),
            &request("week", "2025-08-22", "habit", None),
            &[minutes, sets],
            &[],
        );

        assert_eq!(report.summary[0].sum, Some(2.0));
        assert_eq!(report.summary[1].sum, Some(3.0));
    }

    #[test]
    fn max_aggregation_folds_to_extreme() {
        let mut pushups = habit(1, "Pushups", HabitKind::Numeric);
        pushups.aggregation = Aggregation::Max;
        let report = build_report(
            day("2025-08-22"),
            &request("week", "2025-08-22", "date", None),
            &[pushups.clone()],
            &[],
        );
        assert_eq!(report.summary[0].sum, None);

        pushups.records.insert(day("2025-08-18"), Record::Numeric { value: 20.0, entries: 2 });
        pushups.records.insert(day("2025-08-19"), Record::Numeric { value: 35.0, entries: 1 });
        let report = build_report(
            day("2025-08-22"),
            &request("week", "2025-08-22", "date", None),
            &[pushups],
            &[],
        );
        assert_eq!(report.summary[0].sum, Some(35.0));
    }

    #[test]
    fn habit_sort_is_total_even_without_percent() {
        let mut zed = checked("zed", 1, &[]);
        zed.monthly_goal = Some(4);
        let alpha = checked("Alpha", 2, &[]);
        let beta = checked("beta", 3, &[]);
        let alpha_twin = checked("alpha", 4, &[]);

        let report = build_report(
            day("2025-08-22"),
            &request("month", "2025-08-01", "habit", None),
            &[zed, alpha, beta, alpha_twin],
            &[],
        );
        let names: Vec<&str> = report.summary.iter().map(|row| row.habit.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta", "zed"]);
    }

    #[test]
    fn percent_sort_is_descending_with_missing_as_zero() {
        let mut low = checked("Low", 1, &["2025-08-01"]);
        low.monthly_goal = Some(10);
        let none = checked("None", 2, &["2025-08-01"]);
        let mut high = checked("High", 3, &["2025-08-01", "2025-08-02"]);
        high.monthly_goal = Some(2);

        let report = build_report(
            day("2025-08-22"),
            &request("month", "2025-08-01", "rating", None),
            &[low, none, high],
            &[],
        );
        let ids: Vec<HabitId> = report.summary.iter().map(|row| row.habit_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn tag_filter_applies_to_habits_and_journal() {
        let mut read = checked("Read", 1, &["2025-08-22"]);
        read.tags = vec!["Books".to_string()];
        let gym = checked("Gym", 2, &["2025-08-22"]);
        let mut inactive = checked("Old", 3, &["2025-08-22"]);
        inactive.tags = vec!["books".to_string()];
        inactive.active = false;

        let entries = vec![
            entry(1, "2025-08-20", Some(4), &["books"]),
            entry(2, "2025-08-21", None, &["film"]),
            entry(3, "2025-07-01", Some(5), &["BOOKS"]),
        ];

        let report = build_report(
            day("2025-08-22"),
            &request("month", "2025-08-01", "date", Some("BOOKS")),
            &[read, gym, inactive],
            &entries,
        );
        assert_eq!(report.summary.len(), 1);
        assert_eq!(report.summary[0].habit, "Read");
        assert_eq!(report.count, 2);
        assert!(matches!(&report.rows[0], ReportRow::Journal(row) if row.id == 1));
        assert!(matches!(&report.rows[1], ReportRow::Habit(row) if row.habit == "Read"));
    }

    #[test]
    fn rating_sort_puts_unrated_last() {
        let entries = vec![
            entry(1, "2025-08-20", None, &[]),
            entry(2, "2025-08-21", Some(2), &[]),
            entry(3, "2025-08-22", Some(5), &[]),
        ];
        let report = build_report(
            day("2025-08-22"),
            &request("month", "2025-08-01", "rating", None),
            &[],
            &entries,
        );
        let ids: Vec<EntryId> = report
            .rows
            .iter()
            .filter_map(|row| match row {
                ReportRow::Journal(row) => Some(row.id),
                ReportRow::Habit(_) => None,
            })
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn habit_rows_carry_kind_specific_fields() {
        let mut run = habit(1, "Run", HabitKind::Metrics);
        run.records.insert(
            day("2025-08-22"),
            Record::Metrics(Metrics {
                time_min: 25.0,
                distance_km: 4.2,
            }),
        );
        let report = build_report(
            day("2025-08-22"),
            &request("day", "2025-08-22", "date", None),
            &[run],
            &[],
        );
        let value = serde_json::to_value(&report.rows[0]).unwrap();
        assert_eq!(value["type"], "habit");
        assert_eq!(value["timeMin"], 25.0);
        assert_eq!(value["done"], true);
        assert_eq!(value["value"], serde_json::Value::Null);
    }
}
