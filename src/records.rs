//! Per-day habit records: ingestion, reads and writes.
//!
//! Records are normalized into [`Record`] exactly once, when they enter the
//! store (a write request or a habit loaded from disk). Everything past that
//! point works on the typed form.

use crate::models::{
    Aggregation, DEFAULT_COLOR, Habit, HabitId, HabitKind, Metrics, Record,
};
use crate::tags::normalize_tags;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("{kind} habit cannot store a {found} record")]
    TypeMismatch { kind: HabitKind, found: &'static str },
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
    #[error("record for {date}: {source}")]
    Stored {
        date: NaiveDate,
        #[source]
        source: Box<RecordError>,
    },
}

/// Any record shape a client or an older data file may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordInput {
    Flag(bool),
    Number(f64),
    Fields(RecordFields),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub entries: Option<u32>,
    #[serde(default)]
    pub time_min: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
}

impl RecordInput {
    pub fn metrics(metrics: Metrics) -> Self {
        RecordInput::Fields(RecordFields {
            metrics: Some(metrics),
            ..RecordFields::default()
        })
    }
}

enum Shape {
    Done(bool),
    Value { value: f64, entries: u32 },
    Metrics(Metrics),
    Empty,
}

impl Shape {
    fn of(input: RecordInput) -> Self {
        match input {
            RecordInput::Flag(done) => Shape::Done(done),
            RecordInput::Number(value) => Shape::Value { value, entries: 1 },
            RecordInput::Fields(fields) => {
                if let Some(value) = fields.value {
                    Shape::Value {
                        value,
                        entries: fields.entries.unwrap_or(1).max(1),
                    }
                } else if let Some(metrics) = fields.metrics {
                    Shape::Metrics(metrics)
                } else if fields.time_min.is_some() || fields.distance_km.is_some() {
                    Shape::Metrics(Metrics {
                        time_min: fields.time_min.unwrap_or(0.0),
                        distance_km: fields.distance_km.unwrap_or(0.0),
                    })
                } else if let Some(done) = fields.done {
                    Shape::Done(done)
                } else {
                    Shape::Empty
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Shape::Done(_) => "checkbox",
            Shape::Value { .. } => "numeric",
            Shape::Metrics(_) => "metrics",
            Shape::Empty => "empty",
        }
    }
}

/// Type a raw record against the habit kind it is written to.
pub fn normalize(kind: HabitKind, input: RecordInput) -> Result<Record, RecordError> {
    let shape = Shape::of(input);
    match (kind, shape) {
        (HabitKind::Checkbox, Shape::Done(done)) => Ok(Record::Checkbox(done)),
        (HabitKind::Metrics, Shape::Metrics(metrics)) => {
            check_metric("timeMin", metrics.time_min)?;
            check_metric("distanceKm", metrics.distance_km)?;
            Ok(Record::Metrics(metrics))
        }
        (HabitKind::Numeric, Shape::Value { value, entries }) => {
            if !value.is_finite() {
                return Err(RecordError::InvalidValue {
                    field: "value",
                    value,
                });
            }
            Ok(Record::Numeric { value, entries })
        }
        (kind, shape) => Err(RecordError::TypeMismatch {
            kind,
            found: shape.name(),
        }),
    }
}

fn check_metric(field: &'static str, value: f64) -> Result<(), RecordError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RecordError::InvalidValue { field, value })
    }
}

/// Read-side view of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordView {
    Empty,
    Checkbox {
        done: bool,
    },
    Metrics {
        #[serde(rename = "timeMin")]
        time_min: f64,
        #[serde(rename = "distanceKm")]
        distance_km: f64,
    },
    Numeric {
        value: f64,
    },
}

pub fn read_record(habit: &Habit, date: NaiveDate) -> RecordView {
    match habit.records.get(&date) {
        None => RecordView::Empty,
        Some(Record::Checkbox(done)) => RecordView::Checkbox { done: *done },
        Some(Record::Metrics(metrics)) => RecordView::Metrics {
            time_min: metrics.time_min,
            distance_km: metrics.distance_km,
        },
        Some(Record::Numeric { value, .. }) => RecordView::Numeric { value: *value },
    }
}

pub fn is_qualifying(habit: &Habit, date: NaiveDate) -> bool {
    habit
        .records
        .get(&date)
        .is_some_and(|record| record_qualifies(habit, record))
}

pub fn record_qualifies(habit: &Habit, record: &Record) -> bool {
    match record {
        Record::Checkbox(done) => *done,
        Record::Metrics(metrics) => metrics.time_min > 0.0 || metrics.distance_km > 0.0,
        Record::Numeric { value, .. } => {
            *value > 0.0 && habit.daily_goal.is_none_or(|goal| *value >= goal)
        }
    }
}

/// Return `habit` with the cell at `date` written. Multi-entry numeric habits
/// fold the input into the existing cell; every other write replaces it.
pub fn write_record(
    habit: &Habit,
    date: NaiveDate,
    input: RecordInput,
) -> Result<Habit, RecordError> {
    let incoming = normalize(habit.kind, input)?;
    let cell = match (incoming, habit.records.get(&date)) {
        (Record::Numeric { value, .. }, Some(Record::Numeric { value: current, entries }))
            if habit.allow_multi =>
        {
            Record::Numeric {
                value: habit.aggregation.combine(*current, *entries, value),
                entries: entries.saturating_add(1),
            }
        }
        (Record::Numeric { value, .. }, None) if habit.allow_multi => Record::Numeric {
            value: habit.aggregation.start(value),
            entries: 1,
        },
        // `entries` is only trusted when loaded from disk; a write is one entry.
        (Record::Numeric { value, .. }, _) => Record::Numeric { value, entries: 1 },
        (record, _) => record,
    };

    let mut next = habit.clone();
    next.records.insert(date, cell);
    Ok(next)
}

pub fn clear_record(habit: &Habit, date: NaiveDate) -> Habit {
    let mut next = habit.clone();
    next.records.remove(&date);
    next
}

pub fn toggle_record(habit: &Habit, date: NaiveDate) -> Result<Habit, RecordError> {
    if habit.kind != HabitKind::Checkbox {
        return Err(RecordError::TypeMismatch {
            kind: habit.kind,
            found: "checkbox",
        });
    }
    let done = !is_qualifying(habit, date);
    let mut next = habit.clone();
    next.records.insert(date, Record::Checkbox(done));
    Ok(next)
}

/// On-disk form of a habit, accepting every record shape older files used.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRepr {
    id: HabitId,
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    kind: HabitKind,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    aggregation: Option<Aggregation>,
    #[serde(default)]
    allow_multi: bool,
    #[serde(default)]
    daily_goal: Option<f64>,
    #[serde(default)]
    monthly_goal: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    records: BTreeMap<NaiveDate, RecordInput>,
}

impl TryFrom<HabitRepr> for Habit {
    type Error = RecordError;

    fn try_from(repr: HabitRepr) -> Result<Self, Self::Error> {
        let mut records = BTreeMap::new();
        for (date, input) in repr.records {
            let record = normalize(repr.kind, input).map_err(|source| RecordError::Stored {
                date,
                source: Box::new(source),
            })?;
            records.insert(date, record);
        }

        let numeric = repr.kind == HabitKind::Numeric;
        Ok(Habit {
            id: repr.id,
            name: repr.name,
            color: repr.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            kind: repr.kind,
            unit: repr.unit.filter(|_| numeric),
            aggregation: repr.aggregation.unwrap_or_default(),
            allow_multi: numeric && repr.allow_multi,
            daily_goal: repr.daily_goal.filter(|_| numeric),
            monthly_goal: repr.monthly_goal.filter(|goal| *goal > 0),
            tags: normalize_tags(repr.tags),
            active: repr.active.unwrap_or(true),
            records,
        })
    }
}
