use crate::calendar::{YearMonth, activity_counts, grid_for, parse_day};
use crate::errors::AppError;
use crate::models::{
    ActivityResponse, AddEntryRequest, AddHabitRequest, CalendarQuery, CalendarResponse,
    DataQuery, DataResponse, DateQuery, DeletedResponse, EntryIdRequest, Habit,
    HabitActiveRequest, HabitGoalRequest, HabitId, HabitIdRequest, HabitKind, HabitTagsRequest,
    HabitValuesQuery, JournalEntry, MetricsRequest, MonthQuery, NumericSetRequest,
    RecordDayRequest, ReportQuery, SetRecordRequest, UpdateEntryRequest,
};
use crate::records::{RecordInput, RecordView, read_record};
use crate::report::{Report, ReportRequest, build_report};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Local, NaiveDate};
use tracing::info;

pub async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Json<DataResponse>, AppError> {
    let data = state.data.lock().await;
    let habits = if query.all {
        data.habits.clone()
    } else {
        data.active_habits().cloned().collect()
    };
    Ok(Json(DataResponse {
        today: today(),
        habits,
    }))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<ActivityResponse>, AppError> {
    let month = required_month(query.month.as_deref())?;
    let data = state.data.lock().await;
    Ok(Json(ActivityResponse {
        month,
        date_counts: activity_counts(&data.habits, &data.journal, month),
    }))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let today = today();
    let month = match query.month.as_deref() {
        Some(raw) => raw.parse::<YearMonth>()?,
        None => YearMonth::of(today),
    };
    let selected = match query.selected.as_deref() {
        Some(raw) => parse_day(raw)?,
        None => today,
    };

    let data = state.data.lock().await;
    let activity = activity_counts(&data.habits, &data.journal, month);
    Ok(Json(CalendarResponse {
        month,
        today,
        selected,
        cells: grid_for(month, today, selected, &activity),
    }))
}

pub async fn get_tags(State(state): State<AppState>) -> Json<Vec<String>> {
    let data = state.data.lock().await;
    Json(data.all_tags())
}

pub async fn get_habit_values(
    State(state): State<AppState>,
    Query(query): Query<HabitValuesQuery>,
) -> Result<Json<RecordView>, AppError> {
    let (Some(id), Some(date)) = (query.habit_id, query.date.as_deref()) else {
        return Err(AppError::bad_request("habit_id and date are required"));
    };
    let date = parse_day(date)?;
    let data = state.data.lock().await;
    let habit = data.habit(id)?;
    Ok(Json(read_record(habit, date)))
}

pub async fn add_habit(
    State(state): State<AppState>,
    Json(payload): Json<AddHabitRequest>,
) -> Result<Json<Habit>, AppError> {
    let habit = state
        .commit(|data| Ok(data.add_habit(payload)?.clone()))
        .await?;
    info!(id = habit.id, kind = %habit.kind, "habit added");
    Ok(Json(habit))
}

pub async fn set_habit_tags(
    State(state): State<AppState>,
    Json(payload): Json<HabitTagsRequest>,
) -> Result<Json<Habit>, AppError> {
    let habit = state
        .commit(|data| Ok(data.set_habit_tags(payload.id, payload.tags)?.clone()))
        .await?;
    info!(id = habit.id, tags = habit.tags.len(), "habit tags set");
    Ok(Json(habit))
}

pub async fn set_habit_goal(
    State(state): State<AppState>,
    Json(payload): Json<HabitGoalRequest>,
) -> Result<Json<Habit>, AppError> {
    let habit = state
        .commit(|data| {
            Ok(data
                .set_monthly_goal(payload.id, payload.monthly_goal)?
                .clone())
        })
        .await?;
    info!(id = habit.id, goal = ?habit.monthly_goal, "monthly goal set");
    Ok(Json(habit))
}

pub async fn set_habit_active(
    State(state): State<AppState>,
    Json(payload): Json<HabitActiveRequest>,
) -> Result<Json<Habit>, AppError> {
    let habit = state
        .commit(|data| Ok(data.set_active(payload.id, payload.active)?.clone()))
        .await?;
    info!(id = habit.id, active = habit.active, "habit active flag set");
    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Json(payload): Json<HabitIdRequest>,
) -> Result<Json<DeletedResponse>, AppError> {
    let habit = state
        .commit(|data| Ok(data.delete_habit(payload.id)?))
        .await?;
    info!(id = habit.id, records = habit.records.len(), "habit deleted");
    Ok(Json(DeletedResponse {
        ok: true,
        id: habit.id,
    }))
}

pub async fn toggle(
    State(state): State<AppState>,
    Json(payload): Json<RecordDayRequest>,
) -> Result<Json<Habit>, AppError> {
    let date = parse_day(&payload.date)?;
    let habit = state
        .commit(|data| Ok(data.toggle_record(payload.id, date)?.clone()))
        .await?;
    info!(id = habit.id, %date, "checkbox toggled");
    Ok(Json(habit))
}

pub async fn set_metrics(
    State(state): State<AppState>,
    Json(payload): Json<MetricsRequest>,
) -> Result<Json<Habit>, AppError> {
    let date = parse_day(&payload.date)?;
    apply_write(&state, payload.id, date, RecordInput::metrics(payload.metrics)).await
}

pub async fn set_numeric(
    State(state): State<AppState>,
    Json(payload): Json<NumericSetRequest>,
) -> Result<Json<Habit>, AppError> {
    let date = parse_day(&payload.date)?;
    apply_write(&state, payload.id, date, RecordInput::Number(payload.value)).await
}

pub async fn set_record(
    State(state): State<AppState>,
    Json(payload): Json<SetRecordRequest>,
) -> Result<Json<Habit>, AppError> {
    let date = parse_day(&payload.date)?;
    apply_write(&state, payload.id, date, payload.record).await
}

pub async fn clear_numeric(
    State(state): State<AppState>,
    Json(payload): Json<RecordDayRequest>,
) -> Result<Json<Habit>, AppError> {
    apply_clear(&state, payload, Some(HabitKind::Numeric)).await
}

pub async fn clear(
    State(state): State<AppState>,
    Json(payload): Json<RecordDayRequest>,
) -> Result<Json<Habit>, AppError> {
    apply_clear(&state, payload, None).await
}

async fn apply_write(
    state: &AppState,
    id: HabitId,
    date: NaiveDate,
    input: RecordInput,
) -> Result<Json<Habit>, AppError> {
    let habit = state
        .commit(|data| Ok(data.write_record(id, date, input)?.clone()))
        .await?;
    info!(id, %date, "record written");
    Ok(Json(habit))
}

async fn apply_clear(
    state: &AppState,
    payload: RecordDayRequest,
    expected: Option<HabitKind>,
) -> Result<Json<Habit>, AppError> {
    let date = parse_day(&payload.date)?;
    let habit = state
        .commit(|data| Ok(data.clear_record(payload.id, date, expected)?.clone()))
        .await?;
    info!(id = habit.id, %date, "record cleared");
    Ok(Json(habit))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    let Some(raw) = query.date.as_deref() else {
        return Err(AppError::bad_request("date required"));
    };
    let date = parse_day(raw)?;
    let data = state.data.lock().await;
    Ok(Json(data.journal_for(date)))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Json(payload): Json<AddEntryRequest>,
) -> Result<Json<JournalEntry>, AppError> {
    let date = parse_day(&payload.date)?;
    let entry = state
        .commit(|data| Ok(data.add_entry(date, payload)?.clone()))
        .await?;
    info!(id = entry.id, %date, "journal entry added");
    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<JournalEntry>, AppError> {
    let entry = state
        .commit(|data| Ok(data.update_entry(payload)?.clone()))
        .await?;
    info!(id = entry.id, "journal entry updated");
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Json(payload): Json<EntryIdRequest>,
) -> Result<Json<DeletedResponse>, AppError> {
    let entry = state
        .commit(|data| Ok(data.delete_entry(payload.id)?))
        .await?;
    info!(id = entry.id, "journal entry deleted");
    Ok(Json(DeletedResponse {
        ok: true,
        id: entry.id,
    }))
}

pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, AppError> {
    let today = today();
    let request = ReportRequest::from_params(
        today,
        query.period.as_deref(),
        query.start.as_deref(),
        query.end.as_deref(),
        query.sort.as_deref(),
        query.tag.as_deref(),
    )?;
    let data = state.data.lock().await;
    Ok(Json(build_report(
        today,
        &request,
        &data.habits,
        &data.journal,
    )))
}

fn required_month(raw: Option<&str>) -> Result<YearMonth, AppError> {
    match raw {
        Some(raw) => Ok(raw.parse()?),
        None => Err(AppError::bad_request("month=YYYY-MM required")),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
