//! On-disk persistence for usage history and typeahead queries.
//!
//! Both files are JSON and written atomically (temp file + rename). A
//! missing file loads as empty; a corrupt one is logged and ignored so a bad
//! cache never prevents the launcher from starting.

use chrono::{DateTime, Utc};
use lantern_query::{HistoryTable, MemoryHistory, TypeaheadStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;

/// Usage history backed by a JSON file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    memory: Arc<MemoryHistory>,
}

impl HistoryStore {
    /// Loads the history at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table: HistoryTable = read_json_or_default(&path);
        tracing::debug!(path = %path.display(), keys = table.len(), "history loaded");
        Self {
            path,
            memory: Arc::new(MemoryHistory::from_table(table)),
        }
    }

    /// In-memory view shared with the query engine.
    pub fn memory(&self) -> Arc<MemoryHistory> {
        Arc::clone(&self.memory)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records an activation in memory.
    pub fn record_use(&self, identifier: &str, query: &str, at: DateTime<Utc>) {
        self.memory.record_use(identifier, query, at);
    }

    /// Drops all recorded usage in memory.
    pub fn reset(&self) {
        self.memory.reset();
        tracing::info!(path = %self.path.display(), "usage history reset");
    }

    /// Writes the current table to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.memory.snapshot())
    }
}

/// Loads remembered typeahead queries, most recent first.
pub fn load_typeahead(path: &Path) -> TypeaheadStore {
    let queries: Vec<String> = read_json_or_default(path);
    TypeaheadStore::from_queries(queries)
}

/// Writes remembered typeahead queries.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_typeahead(path: &Path, store: &TypeaheadStore) -> Result<()> {
    write_json_atomic(path, &store.queries())
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read cache file");
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt cache file");
            T::default()
        }
    }
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
