//! Mutations and lookups over the in-memory snapshot. Each method validates
//! its input and hands back the entity it changed.

use crate::models::{
    AddEntryRequest, AddHabitRequest, AppData, Aggregation, DEFAULT_COLOR, EntryId, Habit,
    HabitId, HabitKind, JournalEntry, TagsInput, UpdateEntryRequest,
};
use crate::records::{self, RecordError, RecordInput};
use crate::tags::{collect_tags, normalize_tags, parse_tags};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

const MAX_ENTRY_TEXT: usize = 500;
const MAX_RATING: u8 = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("habit {0} not found")]
    HabitNotFound(HabitId),
    #[error("journal entry {0} not found")]
    EntryNotFound(EntryId),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => normalize_tags(tags),
            TagsInput::Text(raw) => parse_tags(&raw),
        }
    }
}

impl AppData {
    pub fn active_habits(&self) -> impl Iterator<Item = &Habit> {
        self.habits.iter().filter(|habit| habit.active)
    }

    pub fn habit(&self, id: HabitId) -> Result<&Habit, StoreError> {
        self.habits
            .iter()
            .find(|habit| habit.id == id)
            .ok_or(StoreError::HabitNotFound(id))
    }

    fn habit_index(&self, id: HabitId) -> Result<usize, StoreError> {
        self.habits
            .iter()
            .position(|habit| habit.id == id)
            .ok_or(StoreError::HabitNotFound(id))
    }

    fn allocate_habit_id(&mut self) -> HabitId {
        let highest = self.habits.iter().map(|habit| habit.id).max().unwrap_or(0);
        let id = self.next_habit_id.max(highest + 1);
        self.next_habit_id = id + 1;
        id
    }

    fn allocate_entry_id(&mut self) -> EntryId {
        let highest = self.journal.iter().map(|entry| entry.id).max().unwrap_or(0);
        let id = self.next_entry_id.max(highest + 1);
        self.next_entry_id = id + 1;
        id
    }

    pub fn add_habit(&mut self, request: AddHabitRequest) -> Result<&Habit, StoreError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::Invalid("name required".to_string()));
        }
        let kind = match request.kind.as_deref().map(str::trim) {
            None | Some("") => HabitKind::Checkbox,
            Some(raw) => HabitKind::parse(raw)
                .ok_or_else(|| StoreError::Invalid(format!("unknown habit kind '{raw}'")))?,
        };
        let aggregation = match request.aggregation.as_deref().map(str::trim) {
            None | Some("") => Aggregation::Sum,
            Some(raw) => Aggregation::parse(raw)
                .ok_or_else(|| StoreError::Invalid(format!("unknown aggregation '{raw}'")))?,
        };
        if let Some(goal) = request.daily_goal {
            if !goal.is_finite() || goal < 0.0 {
                return Err(StoreError::Invalid(format!("invalid daily goal {goal}")));
            }
        }

        let numeric = kind == HabitKind::Numeric;
        let id = self.allocate_habit_id();
        let habit = Habit {
            id,
            name,
            color: request
                .color
                .map(|color| color.trim().to_string())
                .filter(|color| !color.is_empty())
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            kind,
            unit: request
                .unit
                .map(|unit| unit.trim().to_string())
                .filter(|unit| numeric && !unit.is_empty()),
            aggregation,
            allow_multi: numeric && request.allow_multi,
            daily_goal: request.daily_goal.filter(|_| numeric),
            monthly_goal: request.monthly_goal.filter(|goal| *goal > 0),
            tags: request.tags.into_tags(),
            active: true,
            records: BTreeMap::new(),
        };
        self.habits.push(habit);
        Ok(&self.habits[self.habits.len() - 1])
    }

    pub fn set_habit_tags(&mut self, id: HabitId, tags: TagsInput) -> Result<&Habit, StoreError> {
        let index = self.habit_index(id)?;
        let habit = &mut self.habits[index];
        habit.tags = tags.into_tags();
        Ok(habit)
    }

    /// `None` or zero clears the goal.
    pub fn set_monthly_goal(
        &mut self,
        id: HabitId,
        goal: Option<u32>,
    ) -> Result<&Habit, StoreError> {
        let index = self.habit_index(id)?;
        let habit = &mut self.habits[index];
        habit.monthly_goal = goal.filter(|goal| *goal > 0);
        Ok(habit)
    }

    pub fn set_active(&mut self, id: HabitId, active: bool) -> Result<&Habit, StoreError> {
        let index = self.habit_index(id)?;
        let habit = &mut self.habits[index];
        habit.active = active;
        Ok(habit)
    }

    /// Removes the habit and its records.
    pub fn delete_habit(&mut self, id: HabitId) -> Result<Habit, StoreError> {
        let index = self.habit_index(id)?;
        Ok(self.habits.remove(index))
    }

    fn replace_habit<F>(&mut self, id: HabitId, update: F) -> Result<&Habit, StoreError>
    where
        F: FnOnce(&Habit) -> Result<Habit, RecordError>,
    {
        let index = self.habit_index(id)?;
        let next = update(&self.habits[index])?;
        self.habits[index] = next;
        Ok(&self.habits[index])
    }

    pub fn write_record(
        &mut self,
        id: HabitId,
        date: NaiveDate,
        input: RecordInput,
    ) -> Result<&Habit, StoreError> {
        self.replace_habit(id, |habit| records::write_record(habit, date, input))
    }

    pub fn toggle_record(&mut self, id: HabitId, date: NaiveDate) -> Result<&Habit, StoreError> {
        self.replace_habit(id, |habit| records::toggle_record(habit, date))
    }

    /// Clear one cell. With `expected` set, the habit must be of that kind.
    pub fn clear_record(
        &mut self,
        id: HabitId,
        date: NaiveDate,
        expected: Option<HabitKind>,
    ) -> Result<&Habit, StoreError> {
        self.replace_habit(id, |habit| match expected {
            Some(kind) if kind != habit.kind => Err(RecordError::TypeMismatch {
                kind: habit.kind,
                found: kind.as_str(),
            }),
            _ => Ok(records::clear_record(habit, date)),
        })
    }

    /// Entries of one day, newest first.
    pub fn journal_for(&self, date: NaiveDate) -> Vec<JournalEntry> {
        let mut entries: Vec<JournalEntry> = self
            .journal
            .iter()
            .filter(|entry| entry.date == date)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries
    }

    pub fn add_entry(
        &mut self,
        date: NaiveDate,
        request: AddEntryRequest,
    ) -> Result<&JournalEntry, StoreError> {
        let text = entry_text(&request.text)?;
        let rating = check_rating(request.rating)?;
        let id = self.allocate_entry_id();
        self.journal.push(JournalEntry {
            id,
            date,
            text,
            link: non_empty(request.link),
            category: non_empty(request.category),
            checked: request.checked,
            rating,
            tags: request.tags.into_tags(),
        });
        Ok(&self.journal[self.journal.len() - 1])
    }

    pub fn update_entry(&mut self, request: UpdateEntryRequest) -> Result<&JournalEntry, StoreError> {
        let index = self
            .journal
            .iter()
            .position(|entry| entry.id == request.id)
            .ok_or(StoreError::EntryNotFound(request.id))?;

        let text = request.text.as_deref().map(entry_text).transpose()?;
        let rating = match request.rating {
            Some(rating) => Some(check_rating(rating)?),
            None => None,
        };

        let entry = &mut self.journal[index];
        if let Some(checked) = request.checked {
            entry.checked = checked;
        }
        if let Some(text) = text {
            entry.text = text;
        }
        if let Some(link) = request.link {
            entry.link = non_empty(link);
        }
        if let Some(category) = request.category {
            entry.category = non_empty(category);
        }
        if let Some(rating) = rating {
            entry.rating = rating;
        }
        if let Some(tags) = request.tags {
            entry.tags = tags.into_tags();
        }
        Ok(entry)
    }

    pub fn delete_entry(&mut self, id: EntryId) -> Result<JournalEntry, StoreError> {
        let index = self
            .journal
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(StoreError::EntryNotFound(id))?;
        Ok(self.journal.remove(index))
    }

    pub fn all_tags(&self) -> Vec<String> {
        collect_tags(
            self.habits
                .iter()
                .map(|habit| habit.tags.as_slice())
                .chain(self.journal.iter().map(|entry| entry.tags.as_slice())),
        )
    }
}

fn entry_text(raw: &str) -> Result<String, StoreError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(StoreError::Invalid("text required".to_string()));
    }
    if text.chars().count() > MAX_ENTRY_TEXT {
        return Err(StoreError::Invalid(format!(
            "text longer than {MAX_ENTRY_TEXT} characters"
        )));
    }
    Ok(text.to_string())
}

fn check_rating(rating: Option<u8>) -> Result<Option<u8>, StoreError> {
    match rating {
        Some(value) if value > MAX_RATING => Err(StoreError::Invalid(format!(
            "rating must be between 0 and {MAX_RATING}"
        ))),
        other => Ok(other),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
