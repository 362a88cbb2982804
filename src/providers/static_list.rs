//! Provider backed by a fixed list of entries from the config file.

use async_trait::async_trait;
use lantern_query::{Entry, Provider, ProviderError};

use crate::config::StaticProviderConfig;

/// Returns the same entries for every query; scoring does the filtering.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    name: String,
    prefix: Option<char>,
    switcher_exclusive: bool,
    entries: Vec<Entry>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            switcher_exclusive: false,
            entries,
        }
    }

    pub fn from_config(config: &StaticProviderConfig) -> Self {
        let entries = config
            .entries
            .iter()
            .map(|e| e.to_entry(&config.name))
            .collect();
        Self {
            name: config.name.clone(),
            prefix: config.prefix,
            switcher_exclusive: config.switcher_exclusive,
            entries,
        }
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn prefix(&self) -> Option<char> {
        self.prefix
    }

    fn switcher_exclusive(&self) -> bool {
        self.switcher_exclusive
    }

    async fn entries(&self, _query: &str) -> Result<Vec<Entry>, ProviderError> {
        Ok(self.entries.clone())
    }
}
