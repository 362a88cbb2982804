//! Built-in providers and registry assembly from config.

pub mod command;
pub mod static_list;

pub use command::CommandProvider;
pub use static_list::StaticProvider;

use lantern_query::ProviderRegistry;
use std::sync::Arc;

use crate::config::LanternConfig;
use crate::error::Result;

/// Registers every configured provider, static ones first.
///
/// # Errors
///
/// Fails if no provider is configured, names collide, or the allow-list
/// names nothing that exists.
pub fn build_registry(config: &LanternConfig) -> Result<ProviderRegistry> {
    let mut builder = ProviderRegistry::builder();
    for provider in &config.static_providers {
        builder = builder.register(Arc::new(StaticProvider::from_config(provider)));
    }
    for provider in &config.command_providers {
        builder = builder.register(Arc::new(CommandProvider::new(provider.clone())));
    }
    if let Some(allowed) = &config.query.allow_list {
        builder = builder.with_allow_list(allowed.iter().cloned());
    }
    Ok(builder.build()?)
}
