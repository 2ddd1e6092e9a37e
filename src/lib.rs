pub mod app;
pub mod calendar;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod records;
pub mod report;
pub mod state;
pub mod storage;
pub mod store;
pub mod tags;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
