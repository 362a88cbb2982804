//! Outbound collaborators: the presentation layer and the window tracker.

use crate::types::Entry;

/// Receives ranked snapshots and status changes.
///
/// Implementations own any marshalling onto their UI thread or event loop;
/// the engine calls these methods from async worker tasks and expects them
/// to return promptly.
pub trait Presenter: Send + Sync {
    /// Replace the visible list with `entries`, already in display order.
    fn publish(&self, entries: &[Entry], reset_selection: bool);

    /// Show or hide a busy indicator.
    fn set_busy(&self, busy: bool);

    /// Completion suggestion for the current query, if any.
    fn typeahead(&self, _suggestion: Option<&str>) {}

    /// Routing prefix in effect for the current query, if any.
    fn prefix_changed(&self, _prefix: Option<char>) {}
}

/// Live window information used by context-aware ranking.
pub trait WindowContext: Send + Sync {
    /// Number of open windows whose class is `class`.
    fn open_window_count(&self, class: &str) -> u32;
}
