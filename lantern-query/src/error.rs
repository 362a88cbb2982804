//! Error types for the lantern-query crate.
//!
//! Nothing in here is shown to the user directly: provider failures are
//! recovered into empty batches and cancellation races are silently dropped.
//! [`QueryError`] surfaces at setup time (bad configuration, an empty or
//! inconsistent provider registry) or when a caller names an unknown provider.

/// Errors raised while configuring or driving the query engine.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Invalid query or scoring configuration.
    #[error("config error: {0}")]
    Config(String),

    /// No async runtime was available to spawn query tasks on.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A provider name that is not present in the registry.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Two providers registered under the same name.
    #[error("duplicate provider: {0}")]
    DuplicateProvider(String),
}

/// Errors a single provider call can produce.
///
/// Every variant is recovered locally by the dispatcher and turned into an
/// empty batch for that provider; the rest of the cycle is unaffected.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider reported a failure of its own.
    #[error("provider failed: {0}")]
    Failed(String),

    /// The provider did not answer within the configured timeout.
    #[error("provider timed out after {0}ms")]
    Timeout(u64),

    /// The provider panicked while producing entries.
    #[error("provider panicked: {0}")]
    Panicked(String),

    /// I/O failure inside the provider (subprocess, filesystem scan).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for lantern-query results.
pub type Result<T> = std::result::Result<T, QueryError>;
