use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::history::HistoryEntry;
use crate::model::{Reminders, StorageUnits};

pub const STORAGE_FILE: &str = "storage.json";
pub const HISTORY_FILE: &str = "history.json";
pub const REMINDERS_FILE: &str = "reminders.json";

/// Everything the inventory keeps between runs.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub units: StorageUnits,
    pub history: Vec<HistoryEntry>,
    pub reminders: Reminders,
}

/// JSON documents in the data directory. Reads never create anything on
/// disk; the directory is created on the first write.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot {
            units: read_json(&self.dir.join(STORAGE_FILE))?,
            history: read_json(&self.dir.join(HISTORY_FILE))?,
            reminders: read_json(&self.dir.join(REMINDERS_FILE))?,
        };
        log::debug!(
            "Loaded {} units, {} history entries, {} reminders from {}",
            snapshot.units.len(),
            snapshot.history.len(),
            snapshot.reminders.len(),
            self.dir.display()
        );
        Ok(snapshot)
    }

    /// Load whatever is readable, replacing corrupt documents with empty ones.
    pub fn load_lenient(&self) -> Snapshot {
        Snapshot {
            units: read_json_or_default(&self.dir.join(STORAGE_FILE)),
            history: read_json_or_default(&self.dir.join(HISTORY_FILE)),
            reminders: read_json_or_default(&self.dir.join(REMINDERS_FILE)),
        }
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.ensure_dir()?;
        write_json(&self.dir.join(STORAGE_FILE), &snapshot.units)?;
        write_json(&self.dir.join(HISTORY_FILE), &snapshot.history)?;
        write_json(&self.dir.join(REMINDERS_FILE), &snapshot.reminders)?;
        log::info!("Saved data to {}", self.dir.display());
        Ok(())
    }

    pub fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::FileWrite {
                path: self.dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    let value = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(value)
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{}. Showing it as empty.", e);
            T::default()
        }
    }
}

/// Write via a sibling temp file and rename.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(StoreError::from)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| StoreError::FileWrite {
        path: tmp.display().to_string(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| StoreError::FileWrite {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
