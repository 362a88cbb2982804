//! # lantern-query
//!
//! Incremental, cancellable query engine for the Lantern launcher.
//!
//! Every keystroke submits a query. The engine fans it out to pluggable
//! providers concurrently, scores their entries against the query and the
//! user's usage history, and publishes a ranked list that grows as
//! providers report. A newer query supersedes the running one and nothing
//! from the old cycle reaches the presenter afterwards.
//!
//! ## Design
//!
//! - Providers are trait objects selected by prefix routing, a pin or an
//!   allow-list ([`ProviderRegistry`])
//! - One Tokio task per provider, bounded by a timeout; failures and panics
//!   only cost that provider's batch
//! - Fuzzy matching via `nucleo-matcher`, discounted by field depth and
//!   blended with recency-weighted usage ([`Scorer`])
//! - One [`Aggregator`](aggregator::Aggregator) per cycle merges batches and
//!   republishes the full sorted list after each one
//! - A publish gate serializes presenter updates against cancellation
//!
//! ## Privacy
//!
//! Query text is only logged at trace level.
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use lantern_query::*;
//! # struct Apps;
//! # #[async_trait::async_trait]
//! # impl Provider for Apps {
//! #     fn name(&self) -> &str { "applications" }
//! #     async fn entries(&self, _q: &str) -> Result<Vec<Entry>, ProviderError> { Ok(vec![]) }
//! # }
//! # struct Ui;
//! # impl Presenter for Ui {
//! #     fn publish(&self, _e: &[Entry], _r: bool) {}
//! #     fn set_busy(&self, _b: bool) {}
//! # }
//! # async fn example() -> lantern_query::error::Result<()> {
//! let registry = ProviderRegistry::builder()
//!     .register(Arc::new(Apps))
//!     .build()?;
//! let dispatcher = Dispatcher::new(
//!     registry,
//!     Arc::new(MemoryHistory::new()),
//!     Arc::new(Ui),
//!     QueryConfig::default(),
//! )?;
//! dispatcher.submit("fire");
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod cycle;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod presenter;
pub mod provider;
pub mod router;
pub mod scoring;
pub mod typeahead;
pub mod types;

pub use aggregator::{compare_entries, sort_entries, Batch};
pub use config::{QueryConfig, ScoringConfig};
pub use cycle::{CycleState, QueryCycle};
pub use dispatcher::Dispatcher;
pub use error::{ProviderError, QueryError};
pub use history::{History, HistoryTable, MemoryHistory, NoHistory, Usage};
pub use presenter::{Presenter, WindowContext};
pub use provider::Provider;
pub use router::{ProviderRegistry, Route, RouteSource};
pub use scoring::Scorer;
pub use typeahead::TypeaheadStore;
pub use types::{Entry, HistoryRecord, MatchingPolicy};
