//! Core types: result entries, matching policies, and usage statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an entry takes part in ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingPolicy {
    /// Scored by fuzzy matching against the query.
    #[default]
    Fuzzy,
    /// Pinned above every other entry (e.g. a "run this command" row).
    AlwaysTop,
    /// Pinned below every other entry (e.g. a calculator answer).
    AlwaysBottom,
    /// Anything a provider declared that the engine does not recognise.
    /// Such entries score zero and are dropped.
    #[serde(other)]
    Unknown,
}

impl MatchingPolicy {
    /// Returns the wire name of this policy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fuzzy => "fuzzy",
            Self::AlwaysTop => "always_top",
            Self::AlwaysBottom => "always_bottom",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MatchingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Usage statistics for one entry, as reported by a history collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// How many times the entry was activated.
    pub usage_count: u32,
    /// When it was last activated.
    pub last_used_at: DateTime<Utc>,
    /// Whole days between `last_used_at` and the lookup.
    pub days_since_last_use: u32,
}

/// One candidate result.
///
/// `label` and `identifier` are fixed at construction and only readable
/// afterwards; the scoring fields are filled in by the scoring engine before
/// the entry is handed to an aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    label: String,
    identifier: String,
    /// Secondary display text; second field considered during matching.
    #[serde(default)]
    pub subtitle: String,
    /// Extra text only used for matching (keywords, executable name).
    #[serde(default)]
    pub searchable: String,
    /// Category strings, matched after the text fields in order.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Ranking policy.
    #[serde(default)]
    pub matching: MatchingPolicy,
    /// Name of the provider that produced this entry.
    #[serde(default)]
    pub provider: String,
    /// Window class used to ask the window tracker for open windows.
    #[serde(default)]
    pub window_class: Option<String>,
    /// Final relevance score. Zero means "not yet scored" or "no match".
    #[serde(default)]
    pub final_score: f64,
    /// Best depth-adjusted fuzzy score found while matching.
    #[serde(default)]
    pub fuzzy_score: f64,
    /// Activation count merged from history.
    #[serde(default)]
    pub usage_count: u32,
    /// Days since the last activation, merged from history.
    #[serde(default)]
    pub days_since_last_use: u32,
    /// Time of the last activation, merged from history.
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Open windows belonging to `window_class`, from the window tracker.
    #[serde(default)]
    pub open_window_count: u32,
    /// Discard any provider-supplied score and score from scratch.
    #[serde(default)]
    pub recalculate_score: bool,
    /// Only match the first N words of the query. Zero means no limit.
    #[serde(default)]
    pub match_field_limit: usize,
}

impl Entry {
    /// Creates a fuzzy-matched entry whose identifier is `provider:label`.
    pub fn new(provider: impl Into<String>, label: impl Into<String>) -> Self {
        let provider = provider.into();
        let label = label.into();
        let identifier = format!("{provider}:{label}");
        Self::with_identifier(provider, identifier, label)
    }

    /// Creates an entry with an explicit history identifier.
    pub fn with_identifier(
        provider: impl Into<String>,
        identifier: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            identifier: identifier.into(),
            subtitle: String::new(),
            searchable: String::new(),
            categories: Vec::new(),
            matching: MatchingPolicy::Fuzzy,
            provider: provider.into(),
            window_class: None,
            final_score: 0.0,
            fuzzy_score: 0.0,
            usage_count: 0,
            days_since_last_use: 0,
            last_used_at: None,
            open_window_count: 0,
            recalculate_score: false,
            match_field_limit: 0,
        }
    }

    /// Display text.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stable key for history lookups.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn searchable(mut self, searchable: impl Into<String>) -> Self {
        self.searchable = searchable.into();
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn matching(mut self, matching: MatchingPolicy) -> Self {
        self.matching = matching;
        self
    }

    pub fn window_class(mut self, class: impl Into<String>) -> Self {
        self.window_class = Some(class.into());
        self
    }

    /// Fields considered during fuzzy matching, in descending priority.
    ///
    /// The index of a field in this sequence is its depth: label is 0,
    /// subtitle 1, searchable text 2, then each category.
    pub fn matchable_fields(&self) -> impl Iterator<Item = &str> {
        [
            self.label.as_str(),
            self.subtitle.as_str(),
            self.searchable.as_str(),
        ]
        .into_iter()
        .chain(self.categories.iter().map(String::as_str))
    }

    /// Overwrites the usage fields from `record` if it is more recent than
    /// what the entry already carries. Returns whether anything changed.
    pub fn merge_history(&mut self, record: &HistoryRecord) -> bool {
        let newer = self
            .last_used_at
            .is_none_or(|current| record.last_used_at > current);
        if newer {
            self.usage_count = record.usage_count;
            self.days_since_last_use = record.days_since_last_use;
            self.last_used_at = Some(record.last_used_at);
        }
        newer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(count: u32, days_ago: i64) -> HistoryRecord {
        HistoryRecord {
            usage_count: count,
            last_used_at: Utc::now() - Duration::days(days_ago),
            days_since_last_use: days_ago as u32,
        }
    }

    #[test]
    fn new_entry_derives_identifier_from_provider_and_label() {
        let entry = Entry::new("applications", "Firefox");
        assert_eq!(entry.identifier(), "applications:Firefox");
        assert_eq!(entry.label(), "Firefox");
        assert_eq!(entry.matching, MatchingPolicy::Fuzzy);
        assert_eq!(entry.final_score, 0.0);
    }

    #[test]
    fn matchable_fields_follow_priority_order() {
        let entry = Entry::new("applications", "Firefox")
            .subtitle("Web Browser")
            .searchable("firefox-bin")
            .categories(["Network", "WebBrowser"]);
        let fields: Vec<&str> = entry.matchable_fields().collect();
        assert_eq!(
            fields,
            vec!["Firefox", "Web Browser", "firefox-bin", "Network", "WebBrowser"]
        );
    }

    #[test]
    fn merge_history_fills_unused_entry() {
        let mut entry = Entry::new("applications", "Firefox");
        assert!(entry.merge_history(&record(5, 2)));
        assert_eq!(entry.usage_count, 5);
        assert_eq!(entry.days_since_last_use, 2);
        assert!(entry.last_used_at.is_some());
    }

    #[test]
    fn merge_history_keeps_more_recent_usage() {
        let mut entry = Entry::new("applications", "Firefox");
        entry.merge_history(&record(2, 1));
        assert!(!entry.merge_history(&record(9, 4)));
        assert_eq!(entry.usage_count, 2);
        assert_eq!(entry.days_since_last_use, 1);
    }

    #[test]
    fn unknown_policy_deserializes_to_unknown() {
        let policy: MatchingPolicy = serde_json::from_str("\"sideways\"").expect("deserialize");
        assert_eq!(policy, MatchingPolicy::Unknown);
        let top: MatchingPolicy = serde_json::from_str("\"always_top\"").expect("deserialize");
        assert_eq!(top, MatchingPolicy::AlwaysTop);
    }

    #[test]
    fn entry_deserializes_with_missing_optional_fields() {
        let json = r#"{"label":"Calc","identifier":"calc:1"}"#;
        let entry: Entry = serde_json::from_str(json).expect("deserialize");
        assert_eq!(entry.label(), "Calc");
        assert_eq!(entry.identifier(), "calc:1");
        assert_eq!(entry.matching, MatchingPolicy::Fuzzy);
        assert!(entry.categories.is_empty());
    }

    #[test]
    fn policy_display_uses_wire_name() {
        assert_eq!(MatchingPolicy::AlwaysBottom.to_string(), "always_bottom");
    }
}
