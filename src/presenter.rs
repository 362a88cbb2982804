//! Presenter that turns engine callbacks into protocol events.
//!
//! The engine calls the presenter from worker tasks; events are queued on an
//! unbounded channel and written out by the host's writer task, so no call
//! here ever blocks on I/O.

use lantern_query::{Entry, Presenter};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::host::contract::{EntryView, HostEvent};

/// Queues [`HostEvent`]s and remembers the last published list for activation.
#[derive(Debug)]
pub struct JsonLinesPresenter {
    tx: mpsc::UnboundedSender<HostEvent>,
    visible: Mutex<Vec<Entry>>,
}

impl JsonLinesPresenter {
    /// Creates a presenter and the receiving end of its event queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let presenter = Self {
            tx,
            visible: Mutex::new(Vec::new()),
        };
        (presenter, rx)
    }

    /// Queues an event that did not come from the engine.
    pub fn emit(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event writer gone; dropping event");
        }
    }

    /// Entry at `index` in the currently visible list.
    pub fn entry_at(&self, index: usize) -> Option<Entry> {
        self.visible
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }
}

impl Presenter for JsonLinesPresenter {
    fn publish(&self, entries: &[Entry], reset_selection: bool) {
        *self.visible.lock().unwrap_or_else(PoisonError::into_inner) = entries.to_vec();
        self.emit(HostEvent::Results {
            entries: entries.iter().map(EntryView::from).collect(),
            reset_selection,
        });
    }

    fn set_busy(&self, busy: bool) {
        self.emit(HostEvent::Busy { busy });
    }

    fn typeahead(&self, suggestion: Option<&str>) {
        self.emit(HostEvent::Typeahead {
            suggestion: suggestion.map(str::to_string),
        });
    }

    fn prefix_changed(&self, prefix: Option<char>) {
        self.emit(HostEvent::Prefix { prefix });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_queues_results_and_tracks_visible_list() {
        let (presenter, mut rx) = JsonLinesPresenter::channel();
        let entries = vec![Entry::new("applications", "Firefox")];
        presenter.publish(&entries, true);

        match rx.try_recv().unwrap() {
            HostEvent::Results {
                entries,
                reset_selection,
            } => {
                assert_eq!(entries[0].label, "Firefox");
                assert!(reset_selection);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(presenter.entry_at(0).unwrap().label(), "Firefox");
        assert!(presenter.entry_at(1).is_none());
    }

    #[test]
    fn status_callbacks_become_events() {
        let (presenter, mut rx) = JsonLinesPresenter::channel();
        presenter.set_busy(true);
        presenter.prefix_changed(Some('>'));
        presenter.typeahead(None);
        assert_eq!(rx.try_recv().unwrap(), HostEvent::Busy { busy: true });
        assert_eq!(rx.try_recv().unwrap(), HostEvent::Prefix { prefix: Some('>') });
        assert_eq!(rx.try_recv().unwrap(), HostEvent::Typeahead { suggestion: None });
    }

    #[test]
    fn emitting_after_receiver_drop_is_harmless() {
        let (presenter, rx) = JsonLinesPresenter::channel();
        drop(rx);
        presenter.set_busy(false);
    }
}
