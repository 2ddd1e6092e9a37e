use crate::errors::AppError;
use crate::models::AppData;
use crate::storage::persist_data;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

/// Shared handle to the current snapshot. Mutating handlers hold the lock
/// across the change and the write to disk.
#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Apply `change` to a copy of the snapshot and persist the copy. The
    /// shared snapshot is replaced only once the write has succeeded; on any
    /// error it is left as it was.
    pub async fn commit<T, F>(&self, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut AppData) -> Result<T, AppError>,
    {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let outcome = change(&mut next)?;
        persist_data(&self.data_path, &next).await?;
        *data = next;
        Ok(outcome)
    }
}
