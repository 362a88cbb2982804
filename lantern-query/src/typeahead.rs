//! Completion suggestions from previously activated queries.

use std::sync::{PoisonError, RwLock};

const DEFAULT_CAPACITY: usize = 100;

/// Most-recent-first list of queries that led to an activation.
#[derive(Debug)]
pub struct TypeaheadStore {
    queries: RwLock<Vec<String>>,
    capacity: usize,
}

impl Default for TypeaheadStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TypeaheadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queries: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Seeds the store, most recent first.
    pub fn from_queries<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::default();
        {
            let mut list = store.queries.write().unwrap_or_else(PoisonError::into_inner);
            for query in queries {
                let query: String = query.into();
                let query = query.trim();
                if query.is_empty() || list.iter().any(|q| q == query) {
                    continue;
                }
                list.push(query.to_string());
            }
            list.truncate(store.capacity);
        }
        store
    }

    /// Remembers `query` as the most recent one.
    pub fn record(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        let mut list = self.queries.write().unwrap_or_else(PoisonError::into_inner);
        list.retain(|q| q != query);
        list.insert(0, query.to_string());
        list.truncate(self.capacity);
    }

    /// The most recent remembered query that extends `text`.
    pub fn complete(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        self.queries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|q| q.len() > text.len() && q.starts_with(text))
            .cloned()
    }

    /// Forgets every remembered query.
    pub fn clear(&self) {
        self.queries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Remembered queries, most recent first.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
