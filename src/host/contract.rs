//! Versioned line protocol between the launcher host and its front end.
//!
//! Commands arrive as one JSON object per line, tagged by `command`.
//! Events leave as one JSON object per line, tagged by `event` and carrying
//! the protocol version `v`.

use lantern_query::Entry;
use serde::{Deserialize, Serialize};

/// Protocol version stamped on every event.
pub const PROTOCOL_VERSION: u32 = 1;

/// Front end -> host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    /// The search text changed.
    Query { text: String },
    /// Restrict queries to one provider.
    Pin { provider: String },
    /// Lift the pin and re-run the current text.
    Unpin,
    /// Cancel whatever is running and empty the list.
    Clear,
    /// The user picked the entry at `index` of the last published list.
    Activate { index: usize },
    /// Forget all recorded usage and persist the empty history.
    ResetHistory,
    /// Forget remembered typeahead queries.
    ClearTypeahead,
    /// Save state and exit.
    Stop,
}

/// Display-facing projection of an [`Entry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryView {
    pub label: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    pub provider: String,
    pub score: f64,
}

impl From<&Entry> for EntryView {
    fn from(entry: &Entry) -> Self {
        Self {
            label: entry.label().to_string(),
            identifier: entry.identifier().to_string(),
            subtitle: entry.subtitle.clone(),
            provider: entry.provider.clone(),
            score: entry.final_score,
        }
    }
}

/// Host -> front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Results {
        entries: Vec<EntryView>,
        reset_selection: bool,
    },
    Busy {
        busy: bool,
    },
    Typeahead {
        suggestion: Option<String>,
    },
    Prefix {
        prefix: Option<char>,
    },
    Activated {
        identifier: String,
        label: String,
    },
    Error {
        message: String,
    },
}

/// An event with its protocol version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    #[serde(flatten)]
    pub event: HostEvent,
}

impl From<HostEvent> for EventEnvelope {
    fn from(event: HostEvent) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            event,
        }
    }
}
