//! Result File Storage
//!
//! Cycle results are persisted as pretty-printed JSON files under the output
//! directory, one file per cycle: `cycle_<n>_<YYYYmmdd_HHMMSS>.json`.

use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::CycleResults;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error at {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("JSON error in {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),
}

/// File name for a cycle's results written at `at`
pub fn cycle_file_name(cycle_number: u32, at: DateTime<Local>) -> String {
    format!("cycle_{}_{}.json", cycle_number, at.format("%Y%m%d_%H%M%S"))
}

/// Serialize `value` as pretty JSON, creating parent directories
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Io(parent.to_path_buf(), e))?;
        }
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::Json(path.to_path_buf(), e))?;
    std::fs::write(path, json).map_err(|e| StorageError::Io(path.to_path_buf(), e))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| StorageError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&text).map_err(|e| StorageError::Json(path.to_path_buf(), e))
}

/// Write one cycle's results into `dir` and return the file path
pub fn save_results(results: &CycleResults, dir: &Path) -> Result<PathBuf, StorageError> {
    let path = dir.join(cycle_file_name(results.cycle_number, Local::now()));
    write_json_pretty(&path, results)?;
    info!(path = %path.display(), "✓ Results saved");
    Ok(path)
}

/// Load a results file written by `save_results`
pub fn load_results(path: &Path) -> Result<CycleResults, StorageError> {
    read_json(path)
}
