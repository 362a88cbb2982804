//! Trait definition for pluggable result providers.
//!
//! Each source of candidates (application index, calculator, shell runner,
//! window switcher, ...) implements [`Provider`]. The engine only ever talks
//! to providers through this trait; how a provider finds its entries is its
//! own business.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::Entry;

/// A pluggable source of candidate entries for a query.
///
/// Implementations must be `Send + Sync`: the dispatcher calls every selected
/// provider concurrently, one task each, and the registry shares providers
/// between query cycles.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique provider name, used for pinning, allow-lists and logging.
    fn name(&self) -> &str;

    /// Single-character prefix that routes queries to this provider alone.
    ///
    /// `None` places the provider in the default set.
    fn prefix(&self) -> Option<char> {
        None
    }

    /// Whether the provider only runs when explicitly pinned.
    fn switcher_exclusive(&self) -> bool {
        false
    }

    /// Produce candidate entries for `query`.
    ///
    /// `query` has already had any routing prefix stripped. An empty result
    /// is fine. The call may take a while (subprocesses, filesystem scans)
    /// but must eventually return; the dispatcher bounds it with a timeout.
    ///
    /// # Errors
    ///
    /// Any [`ProviderError`] is logged and treated as an empty batch.
    async fn entries(&self, query: &str) -> Result<Vec<Entry>, ProviderError>;
}
