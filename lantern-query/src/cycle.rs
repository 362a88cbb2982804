//! Query cycle identity, cancellation and the publish gate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a query cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No query has been submitted yet.
    Idle,
    /// Provider tasks are still running.
    Active,
    /// A newer query (or a pin/clear) replaced this cycle.
    Superseded,
    /// Every provider task finished and the busy indicator was cleared.
    Completed,
}

/// One submitted query together with its cancellation token.
#[derive(Debug, Clone)]
pub struct QueryCycle {
    id: u64,
    query: String,
    token: CancellationToken,
    completed: Arc<AtomicBool>,
}

impl QueryCycle {
    pub(crate) fn new(id: u64, query: impl Into<String>) -> Self {
        Self {
            id,
            query: query.into(),
            token: CancellationToken::new(),
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Monotonic cycle number, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn mark_completed(&self) {
        self.completed.store(true, Ordering::Release);
    }

    pub fn state(&self) -> CycleState {
        if self.token.is_cancelled() {
            CycleState::Superseded
        } else if self.completed.load(Ordering::Acquire) {
            CycleState::Completed
        } else {
            CycleState::Active
        }
    }
}

/// Serializes presenter updates against cancellation.
///
/// Publishing checks the token while holding the gate, and superseding
/// cancels while holding it. Once [`PublishGate::supersede`] returns, no
/// publish for the cancelled cycle can reach the presenter.
#[derive(Debug, Clone, Default)]
pub struct PublishGate {
    lock: Arc<Mutex<()>>,
}

impl PublishGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `publish` unless `token` has been cancelled. Returns whether it ran.
    pub fn publish_if_current(&self, token: &CancellationToken, publish: impl FnOnce()) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return false;
        }
        publish();
        true
    }

    /// Cancels `token` so that no further publish for it goes through.
    pub fn supersede(&self, token: &CancellationToken) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
    }
}
