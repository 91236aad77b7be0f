//! CycleRecord persistence.
//!
//! One JSON file per cycle, named by the cycle's timestamp, written to
//! the configured results directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use vigil_core::CycleRecord;

/// Write `record` as pretty JSON to `dir/cycle_results_<millis>.json`.
///
/// Creates the directory if needed and returns the written path.
pub fn save_cycle_record(record: &CycleRecord, dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let path = dir.join(format!("cycle_results_{millis}.json"));

    let json = serde_json::to_string_pretty(record)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(&path, json)?;

    debug!(path = %path.display(), "cycle results saved");
    Ok(path)
}

/// Write `record` to an explicit path (CLI `--output`).
pub fn save_cycle_record_to(record: &CycleRecord, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(path, json)
}
