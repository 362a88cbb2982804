//! Provider registry and prefix routing.
//!
//! The registry is built once and never mutated afterwards, so it can be
//! shared across query cycles without locking. Routing decides which
//! providers see a query and what text they are given.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{QueryError, Result};
use crate::provider::Provider;

/// Why a [`Route`] selected the providers it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// A single provider was pinned by the user.
    Pinned,
    /// A configured allow-list restricts every query.
    AllowList,
    /// The query started with a registered prefix character.
    Prefix,
    /// The default provider set.
    Default,
}

/// Providers selected for one query and the text to give them.
#[derive(Clone)]
pub struct Route {
    pub providers: Vec<Arc<dyn Provider>>,
    /// Query text with any routing prefix removed.
    pub text: String,
    /// Routing prefix in effect, if any.
    pub prefix: Option<char>,
    pub source: RouteSource,
}

impl Route {
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("providers", &self.provider_names())
            .field("text", &self.text)
            .field("prefix", &self.prefix)
            .field("source", &self.source)
            .finish()
    }
}

/// Immutable mapping from routing prefix to providers.
///
/// Key `None` holds the default set: every provider without a prefix.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    routes: HashMap<Option<char>, Vec<Arc<dyn Provider>>>,
    allow_list: Option<Vec<Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up a provider by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Providers registered under `prefix`; `None` is the default set.
    pub fn providers_for(&self, prefix: Option<char>) -> &[Arc<dyn Provider>] {
        self.routes.get(&prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of all registered providers, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn has_allow_list(&self) -> bool {
        self.allow_list.is_some()
    }

    /// Splits off the leading character when some provider owns it.
    fn split_prefix<'q>(&self, query: &'q str) -> Option<(char, &'q str)> {
        let first = query.chars().next()?;
        self.routes
            .contains_key(&Some(first))
            .then(|| (first, &query[first.len_utf8()..]))
    }

    /// Selects providers for `query`.
    ///
    /// Precedence: a pinned provider, then the allow-list, then a leading
    /// prefix character, then the default set. Outside a pin, a registered
    /// leading prefix character is removed from the text, even when the
    /// allow-list decides the providers.
    pub fn route(&self, query: &str, pinned: Option<&str>) -> Route {
        if let Some(name) = pinned {
            match self.get(name) {
                Some(provider) => {
                    return Route {
                        prefix: provider.prefix(),
                        providers: vec![Arc::clone(provider)],
                        text: query.to_string(),
                        source: RouteSource::Pinned,
                    };
                }
                None => tracing::warn!(provider = name, "pinned provider is not registered"),
            }
        }

        let split = self.split_prefix(query);

        if let Some(allowed) = &self.allow_list {
            let (prefix, text) = split.map_or((None, query), |(c, rest)| (Some(c), rest));
            return Route {
                providers: allowed.clone(),
                text: text.to_string(),
                prefix,
                source: RouteSource::AllowList,
            };
        }

        if let Some((first, rest)) = split {
            return Route {
                providers: self.providers_for(Some(first)).to_vec(),
                text: rest.to_string(),
                prefix: Some(first),
                source: RouteSource::Prefix,
            };
        }

        Route {
            providers: self.providers_for(None).to_vec(),
            text: query.to_string(),
            prefix: None,
            source: RouteSource::Default,
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .field("has_allow_list", &self.has_allow_list())
            .finish()
    }
}

/// Collects providers before freezing them into a [`ProviderRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    providers: Vec<Arc<dyn Provider>>,
    allow_list: Option<Vec<String>>,
}

impl RegistryBuilder {
    pub fn register(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Restrict every query to the named providers.
    pub fn with_allow_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Freezes the registry.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Config`] if nothing was registered, or if none of the
    ///   allow-listed names is registered
    /// - [`QueryError::DuplicateProvider`] if two providers share a name
    pub fn build(self) -> Result<ProviderRegistry> {
        if self.providers.is_empty() {
            return Err(QueryError::Config("no providers registered".into()));
        }

        let mut routes: HashMap<Option<char>, Vec<Arc<dyn Provider>>> = HashMap::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if self.providers[..i].iter().any(|p| p.name() == provider.name()) {
                return Err(QueryError::DuplicateProvider(provider.name().to_string()));
            }
            routes
                .entry(provider.prefix())
                .or_default()
                .push(Arc::clone(provider));
        }

        let allow_list = match self.allow_list {
            Some(names) => {
                let mut allowed = Vec::with_capacity(names.len());
                for name in &names {
                    match self.providers.iter().find(|p| p.name() == name) {
                        Some(p) if !allowed.iter().any(|a: &Arc<dyn Provider>| a.name() == name) => {
                            allowed.push(Arc::clone(p));
                        }
                        Some(_) => {}
                        None => tracing::warn!(provider = %name, "allow-listed provider is not registered"),
                    }
                }
                if allowed.is_empty() {
                    return Err(QueryError::Config(format!(
                        "allow_list [{}] matches no registered provider",
                        names.join(", ")
                    )));
                }
                Some(allowed)
            }
            None => None,
        };

        tracing::debug!(count = self.providers.len(), "provider registry built");
        Ok(ProviderRegistry {
            providers: self.providers,
            routes,
            allow_list,
        })
    }
}
