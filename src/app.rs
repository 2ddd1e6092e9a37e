use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", get(handlers::get_data))
        .route("/api/activity", get(handlers::get_activity))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/tags", get(handlers::get_tags))
        .route("/api/habit/values", get(handlers::get_habit_values))
        .route("/api/habits/add", post(handlers::add_habit))
        .route("/api/habits/tags", post(handlers::set_habit_tags))
        .route("/api/habits/goal", post(handlers::set_habit_goal))
        .route("/api/habits/active", post(handlers::set_habit_active))
        .route("/api/habits/delete", post(handlers::delete_habit))
        .route("/api/toggle", post(handlers::toggle))
        .route("/api/metrics", post(handlers::set_metrics))
        .route("/api/numeric/set", post(handlers::set_numeric))
        .route("/api/numeric/clear", post(handlers::clear_numeric))
        .route("/api/records/set", post(handlers::set_record))
        .route("/api/clear", post(handlers::clear))
        .route("/api/media/list", get(handlers::list_entries))
        .route("/api/media/add", post(handlers::add_entry))
        .route("/api/media/update", post(handlers::update_entry))
        .route("/api/media/delete", post(handlers::delete_entry))
        .route("/api/reports", get(handlers::get_report))
        .with_state(state)
}
