use crate::calendar::{DayCell, YearMonth};
use crate::records::{HabitRepr, RecordInput};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type HabitId = u64;
pub type EntryId = u64;

pub const DEFAULT_COLOR: &str = "#6366f1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    #[default]
    Checkbox,
    Numeric,
    Metrics,
}

impl HabitKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "checkbox" => Some(Self::Checkbox),
            "numeric" => Some(Self::Numeric),
            "metrics" => Some(Self::Metrics),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkbox => "checkbox",
            Self::Numeric => "numeric",
            Self::Metrics => "metrics",
        }
    }
}

impl fmt::Display for HabitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How repeated numeric writes on one day combine, and how day values fold
/// into a period total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Count,
    Max,
    Min,
}

impl Aggregation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "sum" => Some(Self::Sum),
            "count" => Some(Self::Count),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            _ => None,
        }
    }

    /// Cell value produced by the first write of `value` to an empty day.
    pub fn start(self, value: f64) -> f64 {
        match self {
            Self::Count => 1.0,
            Self::Sum | Self::Max | Self::Min => value,
        }
    }

    /// Combine an existing cell holding `entries` writes with a new `value`.
    pub fn combine(self, current: f64, entries: u32, value: f64) -> f64 {
        match self {
            Self::Sum => current + value,
            Self::Count => f64::from(entries.saturating_add(1)),
            Self::Max => current.max(value),
            Self::Min => current.min(value),
        }
    }

    /// Fold per-day values into one period figure. `None` when there is
    /// nothing to take an extreme of.
    pub fn fold<I>(self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter();
        match self {
            Self::Sum | Self::Count => Some(values.sum()),
            Self::Max => values.reduce(f64::max),
            Self::Min => values.reduce(f64::min),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default)]
    pub time_min: f64,
    #[serde(default)]
    pub distance_km: f64,
}

/// One habit's value on one day. The variant always matches the owning
/// habit's kind; mixed shapes are rejected when the habit is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Checkbox(bool),
    Metrics(Metrics),
    Numeric { value: f64, entries: u32 },
}

impl Record {
    /// Unchecked checkbox cells are kept on disk but count as no activity.
    pub fn is_active(&self) -> bool {
        !matches!(self, Record::Checkbox(false))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "HabitRepr")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub color: String,
    pub kind: HabitKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub aggregation: Aggregation,
    pub allow_multi: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<f64>,
    pub monthly_goal: Option<u32>,
    pub tags: Vec<String>,
    pub active: bool,
    pub records: BTreeMap<NaiveDate, Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub next_habit_id: HabitId,
    #[serde(default)]
    pub next_entry_id: EntryId,
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub journal: Vec<JournalEntry>,
}

/// Tags arrive either as a JSON list or as the raw text of a tag input.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddHabitRequest {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub monthly_goal: Option<u32>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub aggregation: Option<String>,
    #[serde(default)]
    pub daily_goal: Option<f64>,
    #[serde(default)]
    pub allow_multi: bool,
    #[serde(default)]
    pub tags: TagsInput,
}

#[derive(Debug, Deserialize)]
pub struct HabitIdRequest {
    pub id: HabitId,
}

#[derive(Debug, Deserialize)]
pub struct HabitTagsRequest {
    pub id: HabitId,
    #[serde(default)]
    pub tags: TagsInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitGoalRequest {
    pub id: HabitId,
    #[serde(default)]
    pub monthly_goal: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HabitActiveRequest {
    pub id: HabitId,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecordDayRequest {
    pub id: HabitId,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct MetricsRequest {
    pub id: HabitId,
    pub date: String,
    #[serde(default)]
    pub metrics: Metrics,
}

#[derive(Debug, Deserialize)]
pub struct NumericSetRequest {
    pub id: HabitId,
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct SetRecordRequest {
    pub id: HabitId,
    pub date: String,
    pub record: RecordInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddEntryRequest {
    pub date: String,
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub tags: TagsInput,
}

/// Partial update. For the nullable fields an explicit `null` clears the
/// value while an omitted key leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryRequest {
    pub id: EntryId,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: Option<Option<u8>>,
    #[serde(default)]
    pub tags: Option<TagsInput>,
}

#[derive(Debug, Deserialize)]
pub struct EntryIdRequest {
    pub id: EntryId,
}

#[derive(Debug, Deserialize, Default)]
pub struct DataQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub month: Option<String>,
    pub selected: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HabitValuesQuery {
    pub habit_id: Option<HabitId>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReportQuery {
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub sort: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub today: NaiveDate,
    pub habits: Vec<Habit>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub month: YearMonth,
    pub date_counts: BTreeMap<NaiveDate, u32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub month: YearMonth,
    pub today: NaiveDate,
    pub selected: NaiveDate,
    pub cells: Vec<DayCell>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub ok: bool,
    pub id: u64,
}

fn default_true() -> bool {
    true
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
