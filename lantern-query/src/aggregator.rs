//! Per-cycle result aggregation and display ordering.
//!
//! Provider tasks send scored [`Batch`]es over a channel; one aggregator per
//! cycle merges them, re-sorts the whole list and republishes after every
//! non-empty batch. The channel closing (all senders dropped) is the
//! completion barrier that clears the busy indicator.

use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cycle::{PublishGate, QueryCycle};
use crate::presenter::Presenter;
use crate::types::{Entry, MatchingPolicy};

/// Scored entries from one provider.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub provider: String,
    pub entries: Vec<Entry>,
}

impl Batch {
    pub fn new(provider: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            provider: provider.into(),
            entries,
        }
    }

    pub fn empty(provider: impl Into<String>) -> Self {
        Self::new(provider, Vec::new())
    }
}

/// Display order of two entries.
///
/// 1. `AlwaysTop` before everything else, `AlwaysBottom` after.
/// 2. With `context_aware`, two entries that both have history: fewer open
///    windows first.
/// 3. Higher `final_score` first.
/// 4. Equal scores: more recently used first when both have history,
///    otherwise label ascending.
pub fn compare_entries(a: &Entry, b: &Entry, context_aware: bool) -> Ordering {
    let top = |e: &Entry| e.matching == MatchingPolicy::AlwaysTop;
    let bottom = |e: &Entry| e.matching == MatchingPolicy::AlwaysBottom;

    match (top(a), top(b)) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    match (bottom(a), bottom(b)) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    let both_used = a.last_used_at.zip(b.last_used_at);

    if context_aware && both_used.is_some() {
        match a.open_window_count.cmp(&b.open_window_count) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }

    if a.final_score == b.final_score {
        return match both_used {
            Some((a_used, b_used)) => b_used.cmp(&a_used),
            None => a.label().cmp(b.label()),
        };
    }

    b.final_score
        .partial_cmp(&a.final_score)
        .unwrap_or(Ordering::Equal)
}

/// Sorts `entries` into display order. Stable.
///
/// The context-aware rule can make the ordering intransitive, and
/// `slice::sort_by` may panic on such comparators, so this merges by hand.
pub fn sort_entries(entries: Vec<Entry>, context_aware: bool) -> Vec<Entry> {
    merge_sort(entries, &|a, b| compare_entries(a, b, context_aware))
}

fn merge_sort<F>(mut items: Vec<Entry>, cmp: &F) -> Vec<Entry>
where
    F: Fn(&Entry, &Entry) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let next = if cmp(r, l) == Ordering::Less {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

/// How an aggregator finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorOutcome {
    /// Every provider reported and the busy indicator was cleared.
    Completed,
    /// The cycle was cancelled before it could complete.
    Superseded,
}

/// Accumulates batches for one cycle and publishes ranked snapshots.
pub struct Aggregator {
    cycle: QueryCycle,
    entries: Vec<Entry>,
    presenter: Arc<dyn Presenter>,
    gate: PublishGate,
    context_aware: bool,
}

impl Aggregator {
    pub fn new(
        cycle: QueryCycle,
        presenter: Arc<dyn Presenter>,
        gate: PublishGate,
        context_aware: bool,
    ) -> Self {
        Self {
            cycle,
            entries: Vec::new(),
            presenter,
            gate,
            context_aware,
        }
    }

    /// Entries accumulated so far, in display order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Merges one batch and republishes. Returns whether a publish happened.
    ///
    /// Empty batches and batches arriving after cancellation publish nothing.
    pub fn push(&mut self, batch: Batch) -> bool {
        if self.cycle.is_cancelled() {
            tracing::trace!(provider = %batch.provider, "dropping batch for superseded cycle");
            return false;
        }
        tracing::debug!(
            cycle = self.cycle.id(),
            provider = %batch.provider,
            count = batch.entries.len(),
            "batch received"
        );
        if batch.entries.is_empty() {
            return false;
        }

        let mut entries = std::mem::take(&mut self.entries);
        entries.extend(batch.entries);
        self.entries = sort_entries(entries, self.context_aware);

        let entries = &self.entries;
        let presenter = &self.presenter;
        self.gate
            .publish_if_current(self.cycle.token(), || presenter.publish(entries, true))
    }

    /// Clears the busy indicator unless the cycle was cancelled.
    pub fn close(&self) -> bool {
        let presenter = &self.presenter;
        let closed = self
            .gate
            .publish_if_current(self.cycle.token(), || presenter.set_busy(false));
        if closed {
            self.cycle.mark_completed();
            tracing::debug!(
                cycle = self.cycle.id(),
                count = self.entries.len(),
                "query cycle completed"
            );
        }
        closed
    }

    /// Consumes batches until every sender is dropped or the cycle is cancelled.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Batch>) -> AggregatorOutcome {
        let token = self.cycle.token().clone();
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => return AggregatorOutcome::Superseded,
                batch = rx.recv() => match batch {
                    Some(batch) => {
                        self.push(batch);
                    }
                    None => break,
                },
            }
        }
        if self.close() {
            AggregatorOutcome::Completed
        } else {
            AggregatorOutcome::Superseded
        }
    }
}
