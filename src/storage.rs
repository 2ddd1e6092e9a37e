use crate::errors::AppError;
use crate::models::AppData;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

const DEFAULT_DATA_PATH: &str = "data/habits.json";

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    match env::var("APP_DATA_PATH") {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(PathBuf::from(DEFAULT_DATA_PATH)),
    }
}

/// Load the habit snapshot. A missing file starts empty. A file that does not
/// parse (bad JSON, or a stored record that does not fit its habit's kind)
/// also starts empty, after being copied aside to `<name>.corrupt`.
pub async fn load_data(path: &Path) -> AppData {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no habit data yet, starting empty");
            return AppData::default();
        }
        Err(err) => {
            error!(path = %path.display(), "failed to read habit data: {err}");
            return AppData::default();
        }
    };

    match serde_json::from_slice::<AppData>(&bytes) {
        Ok(data) => data,
        Err(err) => {
            error!(
                path = %path.display(),
                line = err.line(),
                column = err.column(),
                "habit data rejected: {err}"
            );
            let backup = backup_path(path);
            match fs::write(&backup, &bytes).await {
                Ok(()) => warn!(backup = %backup.display(), "kept rejected habit data"),
                Err(err) => error!("failed to keep rejected habit data: {err}"),
            }
            AppData::default()
        }
    }
}

/// Write the snapshot through a sibling temp file so a crash mid-write never
/// leaves a truncated data file behind.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    debug!(
        habits = data.habits.len(),
        entries = data.journal.len(),
        next_habit_id = data.next_habit_id,
        "persisted {}",
        path.display()
    );
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}
