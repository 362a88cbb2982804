//! Read access to per-entry usage history, plus an in-memory store.
//!
//! History is keyed by the query text that was typed when an entry was
//! activated, so usage can be scoped to query prefixes: activating
//! "Firefox" after typing `fi` is remembered under `fi`. The scoring engine
//! only reads through [`History`]; writes happen on activation, outside the
//! scoring path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::types::HistoryRecord;

/// A usage-history collaborator.
///
/// Read concurrently by every provider task of a cycle.
pub trait History: Send + Sync {
    /// Look up usage statistics for `identifier`.
    ///
    /// With `Some(prefix)`, only usage recorded under exactly that query key
    /// is returned. With `None`, the most recent record across all query
    /// keys is returned.
    fn lookup(&self, identifier: &str, query_prefix: Option<&str>) -> Option<HistoryRecord>;
}

/// History that never remembers anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl History for NoHistory {
    fn lookup(&self, _identifier: &str, _query_prefix: Option<&str>) -> Option<HistoryRecord> {
        None
    }
}

/// Usage of one entry under one query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub count: u32,
    pub last_used_at: DateTime<Utc>,
}

impl Usage {
    fn to_record(self, now: DateTime<Utc>) -> HistoryRecord {
        let days = (now - self.last_used_at).num_days().max(0);
        HistoryRecord {
            usage_count: self.count,
            last_used_at: self.last_used_at,
            days_since_last_use: u32::try_from(days).unwrap_or(u32::MAX),
        }
    }
}

/// Serializable history table: query key -> identifier -> usage.
pub type HistoryTable = HashMap<String, HashMap<String, Usage>>;

/// In-process history store.
///
/// Reads take a shared lock; [`MemoryHistory::record_use`] takes the write
/// lock, so activations are serialized against each other.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    table: RwLock<HistoryTable>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a previously saved table.
    pub fn from_table(table: HistoryTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Copy of the current table, for persistence.
    pub fn snapshot(&self) -> HistoryTable {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records one activation of `identifier` after typing `query`.
    pub fn record_use(&self, identifier: &str, query: &str, at: DateTime<Utc>) {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let usage = table
            .entry(query.trim().to_string())
            .or_default()
            .entry(identifier.to_string())
            .or_insert(Usage {
                count: 0,
                last_used_at: at,
            });
        usage.count = usage.count.saturating_add(1);
        usage.last_used_at = usage.last_used_at.max(at);
        tracing::debug!(identifier, count = usage.count, "recorded activation");
    }

    /// Inserts or replaces usage for `identifier` under `query`.
    pub fn insert(&self, identifier: &str, query: &str, usage: Usage) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(query.trim().to_string())
            .or_default()
            .insert(identifier.to_string(), usage);
    }

    /// Removes all recorded usage.
    pub fn reset(&self) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_empty(&self) -> bool {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .all(HashMap::is_empty)
    }
}

impl History for MemoryHistory {
    fn lookup(&self, identifier: &str, query_prefix: Option<&str>) -> Option<HistoryRecord> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        match query_prefix {
            Some(prefix) => table
                .get(prefix)
                .and_then(|by_id| by_id.get(identifier))
                .map(|usage| usage.to_record(now)),
            None => table
                .values()
                .filter_map(|by_id| by_id.get(identifier))
                .max_by_key(|usage| usage.last_used_at)
                .map(|usage| usage.to_record(now)),
        }
    }
}
