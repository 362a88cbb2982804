//! Query dispatcher: turns each keystroke into a cancellable fan-out cycle.
//!
//! # Pipeline
//!
//! 1. Supersede the previous cycle (cancel its token under the publish gate)
//! 2. Empty query: show the usage-ranked initial listing, or clear the list
//! 3. Route the query to providers (pin, allow-list, prefix, default set)
//! 4. Publish an empty snapshot, show the busy indicator
//! 5. Spawn one task per provider: fetch with timeout, score, send a batch
//! 6. The cycle's aggregator merges batches and republishes after each one
//! 7. When every provider task has finished, clear the busy indicator
//!
//! Provider failures, timeouts and panics only cost that provider's batch.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::aggregator::{sort_entries, Aggregator, Batch};
use crate::config::QueryConfig;
use crate::cycle::{CycleState, PublishGate, QueryCycle};
use crate::error::{ProviderError, QueryError, Result};
use crate::history::History;
use crate::presenter::{Presenter, WindowContext};
use crate::provider::Provider;
use crate::router::{ProviderRegistry, RouteSource};
use crate::scoring::Scorer;
use crate::typeahead::TypeaheadStore;
use crate::types::Entry;

#[derive(Debug, Default)]
struct DispatchState {
    current: Option<QueryCycle>,
    next_id: u64,
    pinned: Option<String>,
}

/// Entry point for query submission. One per launcher session.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    history: Arc<dyn History>,
    scorer: Arc<Scorer>,
    presenter: Arc<dyn Presenter>,
    typeahead: Option<Arc<TypeaheadStore>>,
    config: QueryConfig,
    gate: PublishGate,
    state: Mutex<DispatchState>,
    runtime: Handle,
}

impl Dispatcher {
    /// Creates a dispatcher bound to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Config`] if `config` fails validation
    /// - [`QueryError::Runtime`] if called outside a Tokio runtime
    pub fn new(
        registry: ProviderRegistry,
        history: Arc<dyn History>,
        presenter: Arc<dyn Presenter>,
        config: QueryConfig,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| QueryError::Runtime(e.to_string()))?;

        if config.show_initial_entries && registry.get(&config.initial_provider).is_none() {
            tracing::warn!(
                provider = %config.initial_provider,
                "initial provider is not registered; empty queries will list nothing"
            );
        }

        let scorer = Arc::new(Scorer::new(config.scoring.clone(), Arc::clone(&history)));
        Ok(Self {
            registry: Arc::new(registry),
            history,
            scorer,
            presenter,
            typeahead: None,
            config,
            gate: PublishGate::new(),
            state: Mutex::new(DispatchState::default()),
            runtime,
        })
    }

    /// Offer completions from `store` when typeahead is enabled.
    pub fn with_typeahead(mut self, store: Arc<TypeaheadStore>) -> Self {
        self.typeahead = Some(store);
        self
    }

    /// Read open-window counts from `context` while scoring.
    ///
    /// Ignored unless `context_aware_history` is on.
    pub fn with_window_context(mut self, context: Arc<dyn WindowContext>) -> Self {
        if !self.config.context_aware_history {
            tracing::debug!("context-aware history is off; window context ignored");
            return self;
        }
        self.scorer = Arc::new(
            Scorer::new(self.config.scoring.clone(), Arc::clone(&self.history))
                .with_window_context(context),
        );
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Name of the pinned provider, if any.
    pub fn pinned(&self) -> Option<String> {
        self.lock_state().pinned.clone()
    }

    /// The most recently started cycle.
    pub fn current_cycle(&self) -> Option<QueryCycle> {
        self.lock_state().current.clone()
    }

    pub fn cycle_state(&self) -> CycleState {
        self.lock_state()
            .current
            .as_ref()
            .map_or(CycleState::Idle, QueryCycle::state)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Supersedes the current cycle and starts a new one.
    fn begin_cycle(&self, query: &str) -> (QueryCycle, Option<String>) {
        let mut state = self.lock_state();
        if let Some(previous) = state.current.take() {
            if previous.state() == CycleState::Active {
                tracing::debug!(cycle = previous.id(), "superseding query cycle");
            }
            self.gate.supersede(previous.token());
        }
        state.next_id += 1;
        let cycle = QueryCycle::new(state.next_id, query);
        state.current = Some(cycle.clone());
        (cycle, state.pinned.clone())
    }

    /// Submits `query` and returns immediately.
    ///
    /// Results arrive through the presenter as providers report. Calling
    /// this again before the cycle completes supersedes it: nothing from the
    /// old cycle is published once this returns.
    pub fn submit(&self, query: &str) -> QueryCycle {
        let text = query.trim();
        let (cycle, pinned) = self.begin_cycle(text);
        tracing::trace!(cycle = cycle.id(), query = text, "query submitted");

        self.offer_typeahead(&cycle, text);

        let has_allow_list = self.registry.has_allow_list();
        if text.is_empty() && pinned.is_none() {
            if self.config.show_initial_entries && !has_allow_list {
                self.spawn_initial_listing(cycle.clone());
                return cycle;
            }
            if !(has_allow_list && self.config.show_initial_entries) {
                self.finish_empty(&cycle, None);
                return cycle;
            }
        }

        let route = self.registry.route(text, pinned.as_deref());
        tracing::debug!(
            cycle = cycle.id(),
            source = ?route.source,
            providers = ?route.provider_names(),
            "dispatching query"
        );

        let presenter = &self.presenter;
        self.gate.publish_if_current(cycle.token(), || {
            presenter.prefix_changed(route.prefix);
            presenter.publish(&[], true);
            presenter.set_busy(true);
        });

        let (tx, rx) = mpsc::channel(route.providers.len().max(1));
        let aggregator = Aggregator::new(
            cycle.clone(),
            Arc::clone(&self.presenter),
            self.gate.clone(),
            self.config.context_aware_history,
        );
        self.runtime.spawn(aggregator.run(rx));

        let explicit = matches!(route.source, RouteSource::Pinned | RouteSource::AllowList);
        let timeout = Duration::from_millis(self.config.provider_timeout_ms);

        for provider in route.providers {
            if provider.switcher_exclusive() && !explicit {
                tracing::trace!(provider = provider.name(), "skipping switcher-exclusive provider");
                continue;
            }

            let tx = tx.clone();
            let scorer = Arc::clone(&self.scorer);
            let token = cycle.token().clone();
            let text = route.text.clone();
            self.runtime.spawn(async move {
                let name = provider.name().to_string();
                let fetched = tokio::select! {
                    biased;
                    () = token.cancelled() => return,
                    fetched = fetch_entries(&provider, &text, timeout) => fetched,
                };
                let entries = match fetched {
                    Ok(entries) => entries,
                    Err(e) => {
                        tracing::warn!(provider = %name, error = %e, "provider failed");
                        Vec::new()
                    }
                };
                if token.is_cancelled() {
                    return;
                }

                let entries = scorer.score_batch(tag_provider(entries, &name), &text);
                if tx.send(Batch::new(name, entries)).await.is_err() {
                    tracing::trace!("aggregator gone before batch was sent");
                }
            });
        }
        drop(tx);

        cycle
    }

    fn offer_typeahead(&self, cycle: &QueryCycle, text: &str) {
        if !self.config.typeahead {
            return;
        }
        let Some(store) = &self.typeahead else {
            return;
        };
        let suggestion = store.complete(text);
        let presenter = &self.presenter;
        self.gate.publish_if_current(cycle.token(), || {
            presenter.typeahead(suggestion.as_deref());
        });
    }

    /// Publishes an empty list and completes `cycle` immediately.
    fn finish_empty(&self, cycle: &QueryCycle, prefix: Option<char>) {
        let presenter = &self.presenter;
        let finished = self.gate.publish_if_current(cycle.token(), || {
            presenter.prefix_changed(prefix);
            presenter.publish(&[], true);
            presenter.set_busy(false);
        });
        if finished {
            cycle.mark_completed();
        }
    }

    fn spawn_initial_listing(&self, cycle: QueryCycle) {
        let presenter = Arc::clone(&self.presenter);
        let gate = self.gate.clone();
        let scorer = Arc::clone(&self.scorer);
        let provider = self.registry.get(&self.config.initial_provider).cloned();
        let context_aware = self.config.context_aware_history;
        let timeout = Duration::from_millis(self.config.provider_timeout_ms);

        gate.publish_if_current(cycle.token(), || {
            presenter.prefix_changed(None);
            presenter.set_busy(true);
        });

        self.runtime.spawn(async move {
            let entries = match &provider {
                Some(provider) => {
                    let fetched = tokio::select! {
                        biased;
                        () = cycle.token().cancelled() => return,
                        fetched = fetch_entries(provider, "", timeout) => fetched,
                    };
                    match fetched {
                        Ok(entries) => tag_provider(entries, provider.name()),
                        Err(e) => {
                            tracing::warn!(provider = provider.name(), error = %e, "initial listing failed");
                            Vec::new()
                        }
                    }
                }
                None => Vec::new(),
            };

            let ranked = sort_entries(scorer.rank_by_usage(entries), context_aware);
            let finished = gate.publish_if_current(cycle.token(), || {
                presenter.publish(&ranked, true);
                presenter.set_busy(false);
            });
            if finished {
                cycle.mark_completed();
                tracing::debug!(cycle = cycle.id(), count = ranked.len(), "initial listing shown");
            }
        });
    }

    /// Restricts subsequent queries to `name` and clears the list.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownProvider`] if no provider has that name.
    pub fn pin(&self, name: &str) -> Result<QueryCycle> {
        let prefix = self
            .registry
            .get(name)
            .ok_or_else(|| QueryError::UnknownProvider(name.to_string()))?
            .prefix();

        self.lock_state().pinned = Some(name.to_string());
        let (cycle, _) = self.begin_cycle("");
        tracing::debug!(provider = name, "provider pinned");
        self.finish_empty(&cycle, prefix);
        Ok(cycle)
    }

    /// Removes the pin and reprocesses `query` against normal routing.
    ///
    /// Returns `None` when nothing was pinned.
    pub fn unpin(&self, query: &str) -> Option<QueryCycle> {
        let previous = self.lock_state().pinned.take()?;
        tracing::debug!(provider = %previous, "provider unpinned");
        Some(self.submit(query))
    }

    /// Supersedes whatever is running and empties the list.
    pub fn clear(&self) -> QueryCycle {
        let (cycle, _) = self.begin_cycle("");
        self.finish_empty(&cycle, None);
        cycle
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("state", &self.cycle_state())
            .finish_non_exhaustive()
    }
}

/// Calls `provider` with a timeout, converting panics into errors.
async fn fetch_entries(
    provider: &Arc<dyn Provider>,
    text: &str,
    timeout: Duration,
) -> std::result::Result<Vec<Entry>, ProviderError> {
    let call = AssertUnwindSafe(provider.entries(text)).catch_unwind();
    match tokio::time::timeout(timeout, call).await {
        Err(_) => Err(ProviderError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
        Ok(Err(panic)) => Err(ProviderError::Panicked(panic_message(panic.as_ref()))),
        Ok(Ok(result)) => result,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn tag_provider(mut entries: Vec<Entry>, name: &str) -> Vec<Entry> {
    for entry in &mut entries {
        if entry.provider.is_empty() {
            entry.provider = name.to_string();
        }
    }
    entries
}
